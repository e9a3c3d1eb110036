// src/handlers/alerts.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermAlertsManage, PermAlertsView, RequirePermission},
    },
    models::alerts::{Alert, AlertFilter, AlertPriority, ScanReport},
};

// GET /api/alerts
#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "Alerts",
    params(AlertFilter),
    responses(
        (status = 200, description = "Alertas, mais graves primeiro", body = Vec<Alert>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_alerts(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAlertsView>,
    Query(filter): Query<AlertFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = app_state
        .alert_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alerts))
}

fn default_priority() -> AlertPriority {
    AlertPriority::Medium
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertPayload {
    #[validate(length(min = 1, max = 200, message = "O título é obrigatório."))]
    #[schema(example = "Máquina de gelo com defeito")]
    pub title: String,

    #[validate(length(min = 1, message = "A mensagem é obrigatória."))]
    pub message: String,

    #[serde(default = "default_priority")]
    pub priority: AlertPriority,
}

// POST /api/alerts
#[utoipa::path(
    post,
    path = "/api/alerts",
    tag = "Alerts",
    request_body = CreateAlertPayload,
    responses(
        (status = 201, description = "Alerta manual (SYSTEM) criado", body = Alert)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_alert(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAlertsManage>,
    Json(payload): Json<CreateAlertPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let alert = app_state
        .alert_service
        .create_manual(&payload.title, &payload.message, payload.priority)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(alert)))
}

// POST /api/alerts/{id}/resolve
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/resolve",
    tag = "Alerts",
    responses(
        (status = 200, description = "Alerta resolvido", body = Alert),
        (status = 409, description = "O alerta não está ativo")
    ),
    params(("id" = Uuid, Path, description = "ID do alerta")),
    security(("api_jwt" = []))
)]
pub async fn resolve_alert(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermAlertsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = app_state
        .alert_service
        .resolve(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alert))
}

// POST /api/alerts/{id}/archive
#[utoipa::path(
    post,
    path = "/api/alerts/{id}/archive",
    tag = "Alerts",
    responses(
        (status = 200, description = "Alerta arquivado", body = Alert),
        (status = 409, description = "O alerta já está arquivado")
    ),
    params(("id" = Uuid, Path, description = "ID do alerta")),
    security(("api_jwt" = []))
)]
pub async fn archive_alert(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAlertsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alert = app_state
        .alert_service
        .archive(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(alert))
}

// POST /api/alerts/scan
#[utoipa::path(
    post,
    path = "/api/alerts/scan",
    tag = "Alerts",
    responses(
        (status = 200, description = "Varredura de produtos e ingredientes", body = ScanReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn scan_alerts(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAlertsManage>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .alert_service
        .scan()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(report))
}
