// src/handlers/suppliers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_cost, validate_quantity},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermSuppliersManage, PermSuppliersView, RequirePermission},
    },
    models::suppliers::{Supplier, SupplierChanges, Supply, SupplyDetail, SupplyStatus},
    services::supplier_service::NewSupply,
};

// =============================================================================
//  FORNECEDORES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[schema(example = "Distribuidora Central")]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub address: Option<String>,
}

// POST /api/suppliers
#[utoipa::path(
    post,
    path = "/api/suppliers",
    tag = "Suppliers",
    request_body = CreateSupplierPayload,
    responses(
        (status = 201, description = "Fornecedor criado", body = Supplier),
        (status = 409, description = "Fornecedor já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersManage>,
    Json(payload): Json<CreateSupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let supplier = app_state
        .supplier_service
        .create_supplier(
            &payload.name,
            payload.contact_person.as_deref(),
            payload.phone.as_deref(),
            payload.email.as_deref(),
            payload.address.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SupplierListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

// GET /api/suppliers
#[utoipa::path(
    get,
    path = "/api/suppliers",
    tag = "Suppliers",
    params(SupplierListQuery),
    responses(
        (status = 200, description = "Fornecedores", body = Vec<Supplier>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersView>,
    Query(query): Query<SupplierListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .supplier_service
        .list_suppliers(!query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(suppliers))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierPayload {
    #[validate(length(min = 1, max = 200, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

// PATCH /api/suppliers/{id}
#[utoipa::path(
    patch,
    path = "/api/suppliers/{id}",
    tag = "Suppliers",
    request_body = UpdateSupplierPayload,
    responses(
        (status = 200, description = "Fornecedor atualizado", body = Supplier),
        (status = 404, description = "Fornecedor não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do fornecedor")),
    security(("api_jwt" = []))
)]
pub async fn update_supplier(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = SupplierChanges {
        name: payload.name,
        contact_person: payload.contact_person,
        phone: payload.phone,
        email: payload.email,
        address: payload.address,
        is_active: payload.is_active,
    };

    let supplier = app_state
        .supplier_service
        .update_supplier(id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplier))
}

// =============================================================================
//  PEDIDOS DE COMPRA
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyLinePayload {
    pub product_id: Uuid,
    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "24")]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_cost"))]
    #[schema(example = "450.00")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplyPayload {
    pub supplier_id: Uuid,

    #[validate(length(max = 100))]
    #[schema(example = "NF-000123")]
    pub reference: Option<String>,

    #[schema(value_type = Option<String>, format = Date, example = "2026-10-25")]
    pub expected_date: Option<NaiveDate>,

    pub notes: Option<String>,

    #[validate(length(min = 1, message = "O pedido precisa de pelo menos um item."))]
    #[validate(nested)]
    pub items: Vec<SupplyLinePayload>,
}

// POST /api/supplies
#[utoipa::path(
    post,
    path = "/api/supplies",
    tag = "Suppliers",
    request_body = CreateSupplyPayload,
    responses(
        (status = 201, description = "Pedido de compra criado (PENDING)", body = SupplyDetail),
        (status = 404, description = "Fornecedor ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSuppliersManage>,
    Json(payload): Json<CreateSupplyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lines = payload
        .items
        .iter()
        .map(|i| (i.product_id, i.quantity, i.unit_price))
        .collect();

    let supply = app_state
        .supplier_service
        .create_supply(
            NewSupply {
                supplier_id: payload.supplier_id,
                reference: payload.reference.as_deref(),
                expected_date: payload.expected_date,
                notes: payload.notes.as_deref(),
                lines,
            },
            user.0.id,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(supply)))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SupplyListQuery {
    pub status: Option<SupplyStatus>,
}

// GET /api/supplies
#[utoipa::path(
    get,
    path = "/api/supplies",
    tag = "Suppliers",
    params(SupplyListQuery),
    responses(
        (status = 200, description = "Pedidos de compra", body = Vec<Supply>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_supplies(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersView>,
    Query(query): Query<SupplyListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let supplies = app_state
        .supplier_service
        .list_supplies(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supplies))
}

// GET /api/supplies/{id}
#[utoipa::path(
    get,
    path = "/api/supplies/{id}",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Pedido com itens", body = SupplyDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do pedido")),
    security(("api_jwt" = []))
)]
pub async fn get_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = app_state
        .supplier_service
        .get_supply(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supply))
}

// POST /api/supplies/{id}/receive
#[utoipa::path(
    post,
    path = "/api/supplies/{id}/receive",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Mercadoria recebida: estoque e custo médio atualizados", body = SupplyDetail),
        (status = 409, description = "O pedido não está pendente")
    ),
    params(("id" = Uuid, Path, description = "ID do pedido")),
    security(("api_jwt" = []))
)]
pub async fn receive_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermSuppliersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = app_state
        .supplier_service
        .receive(id, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supply))
}

// POST /api/supplies/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/supplies/{id}/cancel",
    tag = "Suppliers",
    responses(
        (status = 200, description = "Pedido cancelado", body = SupplyDetail),
        (status = 409, description = "O pedido não está pendente")
    ),
    params(("id" = Uuid, Path, description = "ID do pedido")),
    security(("api_jwt" = []))
)]
pub async fn cancel_supply(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSuppliersManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supply = app_state
        .supplier_service
        .cancel(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(supply))
}
