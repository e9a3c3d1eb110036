// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermSalesView, RequirePermission},
    },
};

// GET /api/sales/{id}/receipt
#[utoipa::path(
    get,
    path = "/api/sales/{id}/receipt",
    tag = "Sales",
    responses(
        (status = 200, description = "Recibo em PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Venda não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da venda")),
    security(("api_jwt" = []))
)]
pub async fn sale_receipt(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesView>,
    Path(sale_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let sale = app_state
        .sales_service
        .get_sale(sale_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // genpdf é síncrono e pesado: roda fora do executor
    let document_service = app_state.document_service.clone();
    let pdf_bytes = tokio::task::spawn_blocking(move || document_service.render_receipt(&sale))
        .await
        .map_err(|e| AppError::InternalServerError(e.into()).to_api_error(&locale, &app_state.i18n_store))?
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Headers para o navegador mostrar ou baixar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"recibo_{}.pdf\"", sale_id),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
