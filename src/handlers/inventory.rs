// src/handlers/inventory.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_stock_delta, validate_stock_level},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermInventoryManage, PermInventoryView, RequirePermission},
    },
    models::{
        inventory::{StockMovement, StockMovementType, StockValuation},
        products::Product,
    },
    services::inventory_service::StockAdjustment,
};

fn default_adjustment() -> StockMovementType {
    StockMovementType::Adjustment
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_target"))]
pub struct AdjustStockPayload {
    pub product_id: Uuid,

    /// Novo saldo absoluto. Tem prioridade sobre `delta`.
    #[validate(custom(function = "validate_stock_level"))]
    pub new_quantity: Option<Decimal>,

    /// Variação com sinal (ex.: -2 para duas garrafas quebradas)
    #[validate(custom(function = "validate_stock_delta"))]
    pub delta: Option<Decimal>,

    #[serde(default = "default_adjustment")]
    pub movement_type: StockMovementType,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn validate_target(payload: &AdjustStockPayload) -> Result<(), ValidationError> {
    if payload.new_quantity.is_none() && payload.delta.is_none() {
        let mut err = ValidationError::new("required");
        err.message = Some("Informe 'newQuantity' ou 'delta'.".into());
        return Err(err);
    }
    Ok(())
}

// POST /api/inventory/adjust
#[utoipa::path(
    post,
    path = "/api/inventory/adjust",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    responses(
        (status = 201, description = "Movimento de ajuste registrado", body = StockMovement),
        (status = 400, description = "Tipo inválido ou perda aumentando o estoque"),
        (status = 409, description = "O estoque ficaria negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermInventoryManage>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .inventory_service
        .adjust_stock(
            StockAdjustment {
                product_id: payload.product_id,
                new_quantity: payload.new_quantity,
                delta: payload.delta,
                movement_type: payload.movement_type,
                notes: payload.notes.as_deref(),
            },
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementQuery {
    pub product_id: Option<Uuid>,
    /// Padrão 100, máximo 500
    pub limit: Option<i64>,
}

// GET /api/inventory/movements
#[utoipa::path(
    get,
    path = "/api/inventory/movements",
    tag = "Inventory",
    params(MovementQuery),
    responses(
        (status = 200, description = "Movimentos mais recentes primeiro", body = Vec<StockMovement>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
    Query(query): Query<MovementQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .inventory_service
        .list_movements(query.product_id, query.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// GET /api/inventory/low-stock
#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    tag = "Inventory",
    responses(
        (status = 200, description = "Produtos ativos no mínimo ou abaixo", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .inventory_service
        .low_stock()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

// GET /api/inventory/valuation
#[utoipa::path(
    get,
    path = "/api/inventory/valuation",
    tag = "Inventory",
    responses(
        (status = 200, description = "Valor do estoque de produtos e ingredientes", body = StockValuation)
    ),
    security(("api_jwt" = []))
)]
pub async fn valuation(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
) -> Result<impl IntoResponse, ApiError> {
    let valuation = app_state
        .inventory_service
        .valuation()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(valuation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjustment_needs_a_target() {
        let payload: AdjustStockPayload = serde_json::from_value(serde_json::json!({
            "productId": Uuid::nil()
        }))
        .unwrap();
        assert_eq!(payload.movement_type, StockMovementType::Adjustment);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn loss_with_delta_is_accepted() {
        let payload: AdjustStockPayload = serde_json::from_value(serde_json::json!({
            "productId": Uuid::nil(),
            "delta": -2,
            "movementType": "LOSS",
            "notes": "Garrafas quebradas"
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }
}
