// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_price, validate_quantity},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSalesCreate, PermSalesManage, PermSalesView, RequirePermission},
    },
    models::sales::{PaymentMethod, Sale, SaleDetail, SaleFilter},
    services::sales_service::{NewSale, SaleLineInput},
};

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLinePayload {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "2")]
    pub quantity: Decimal,

    /// Sem preço, vale o preço de venda cadastrado
    #[validate(custom(function = "validate_price"))]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalePayload {
    #[validate(range(min = 1, message = "Número de mesa inválido."))]
    #[schema(example = 7)]
    pub table_number: Option<i32>,

    #[validate(length(max = 200))]
    pub customer_name: Option<String>,

    #[validate(custom(function = "validate_price"))]
    #[serde(default)]
    pub discount: Decimal,

    pub notes: Option<String>,

    #[validate(length(min = 1, message = "A venda precisa de pelo menos um item."))]
    #[validate(nested)]
    pub items: Vec<SaleLinePayload>,
}

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada e estoque baixado", body = SaleDetail),
        (status = 404, description = "Produto não encontrado ou inativo"),
        (status = 409, description = "Estoque ou ingredientes insuficientes")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSalesCreate>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lines = payload
        .items
        .iter()
        .map(|item| SaleLineInput {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();

    let sale = app_state
        .sales_service
        .create_sale(
            NewSale {
                table_number: payload.table_number,
                customer_name: payload.customer_name.as_deref(),
                discount: payload.discount,
                notes: payload.notes.as_deref(),
                lines,
            },
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SaleFilter),
    responses(
        (status = 200, description = "Vendas, mais recentes primeiro", body = Vec<Sale>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesView>,
    Query(filter): Query<SaleFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let sales = app_state
        .sales_service
        .list_sales(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sales))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    responses(
        (status = 200, description = "Venda com itens", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da venda")),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaySalePayload {
    pub payment_method: PaymentMethod,
}

// POST /api/sales/{id}/pay
#[utoipa::path(
    post,
    path = "/api/sales/{id}/pay",
    tag = "Sales",
    request_body = PaySalePayload,
    responses(
        (status = 200, description = "Venda paga", body = SaleDetail),
        (status = 409, description = "A venda não está em aberto")
    ),
    params(("id" = Uuid, Path, description = "ID da venda")),
    security(("api_jwt" = []))
)]
pub async fn pay_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesCreate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaySalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let sale = app_state
        .sales_service
        .mark_paid(id, payload.payment_method)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelSalePayload {
    #[validate(length(max = 500))]
    #[schema(example = "Cliente desistiu")]
    pub reason: Option<String>,
}

// POST /api/sales/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/sales/{id}/cancel",
    tag = "Sales",
    request_body = CancelSalePayload,
    responses(
        (status = 200, description = "Venda cancelada e estoque devolvido", body = SaleDetail),
        (status = 409, description = "A venda não está em aberto")
    ),
    params(("id" = Uuid, Path, description = "ID da venda")),
    security(("api_jwt" = []))
)]
pub async fn cancel_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSalesManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let sale = app_state
        .sales_service
        .cancel(id, payload.reason.as_deref(), user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sale))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_without_items_fails_validation() {
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "tableNumber": 3,
            "items": []
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 0 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn prices_and_quantities_finer_than_storage_are_rejected() {
        // 3 x 0.335 gravaria 0.34 no item e 1.01 no total
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 3, "unitPrice": 0.335 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        // 0.0005 sumiria no NUMERIC(14,3) do estoque
        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 0.0005 }]
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: CreateSalePayload = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": Uuid::nil(), "quantity": 0.5, "unitPrice": 0.34 }],
            "discount": 0.1
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payment_method_uses_screaming_case() {
        let payload: PaySalePayload =
            serde_json::from_value(serde_json::json!({ "paymentMethod": "MOBILE_MONEY" })).unwrap();
        assert_eq!(payload.payment_method, PaymentMethod::MobileMoney);
    }
}
