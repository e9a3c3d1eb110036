// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermReportsView, RequirePermission},
    },
    models::reports::{DailySummary, PaymentMethodEntry, ReportRange, SummaryQuery, TopProductEntry},
};

// GET /api/reports/daily
#[utoipa::path(
    get,
    path = "/api/reports/daily",
    tag = "Reports",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Resumo do dia: vendas, custo, despesas e lucro", body = DailySummary)
    ),
    security(("api_jwt" = []))
)]
pub async fn daily_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .report_service
        .daily_summary(query.date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}

// GET /api/reports/top-products
#[utoipa::path(
    get,
    path = "/api/reports/top-products",
    tag = "Reports",
    params(ReportRange),
    responses(
        (status = 200, description = "Mais vendidos (vendas pagas)", body = Vec<TopProductEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn top_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<ReportRange>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .report_service
        .top_products(&range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}

// GET /api/reports/payment-methods
#[utoipa::path(
    get,
    path = "/api/reports/payment-methods",
    tag = "Reports",
    params(ReportRange),
    responses(
        (status = 200, description = "Faturamento por forma de pagamento", body = Vec<PaymentMethodEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_by_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsView>,
    Query(range): Query<ReportRange>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .report_service
        .sales_by_payment_method(&range)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entries))
}
