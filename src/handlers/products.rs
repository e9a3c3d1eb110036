// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{validate_cost, validate_price, validate_stock_level},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermProductsManage, PermProductsView, RequirePermission},
    },
    models::products::{Category, ProductChanges, ProductDetail, ProductFilter},
    services::product_service::NewProduct,
};

// =============================================================================
//  CATEGORIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    #[schema(example = "Cervejas")]
    pub name: String,
    pub description: Option<String>,
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Products",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Categoria já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsManage>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .product_service
        .create_category(&payload.name, payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Products",
    responses(
        (status = 200, description = "Categorias", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsView>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .product_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

// =============================================================================
//  PRODUTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[schema(example = "Heineken 33cl")]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 20, message = "A unidade é obrigatória."))]
    #[schema(example = "bottle")]
    pub unit: String,

    #[validate(custom(function = "validate_cost"))]
    #[serde(default)]
    pub purchase_price: Decimal,

    #[validate(custom(function = "validate_price"))]
    pub selling_price: Decimal,

    #[validate(custom(function = "validate_stock_level"))]
    #[serde(default)] // Sem estoque inicial, começa em 0
    pub initial_stock: Decimal,

    #[validate(custom(function = "validate_stock_level"))]
    #[serde(default)]
    pub minimum_stock: Decimal,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = ProductDetail),
        (status = 404, description = "Categoria não encontrada"),
        (status = 409, description = "Produto já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsManage>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .create_product(NewProduct {
            category_id: payload.category_id,
            name: &payload.name,
            description: payload.description.as_deref(),
            unit: &payload.unit,
            purchase_price: payload.purchase_price,
            selling_price: payload.selling_price,
            initial_stock: payload.initial_stock,
            minimum_stock: payload.minimum_stock,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductFilter),
    responses(
        (status = 200, description = "Produtos com margem e situação de estoque", body = Vec<ProductDetail>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsView>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let products = app_state
        .product_service
        .list_products(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(products))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    responses(
        (status = 200, description = "Produto", body = ProductDetail),
        (status = 404, description = "Produto não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do produto")),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .get_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20, message = "A unidade não pode ficar vazia."))]
    pub unit: Option<String>,
    #[validate(custom(function = "validate_cost"))]
    pub purchase_price: Option<Decimal>,
    #[validate(custom(function = "validate_price"))]
    pub selling_price: Option<Decimal>,
    #[validate(custom(function = "validate_stock_level"))]
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl From<UpdateProductPayload> for ProductChanges {
    fn from(p: UpdateProductPayload) -> Self {
        Self {
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            unit: p.unit,
            purchase_price: p.purchase_price,
            selling_price: p.selling_price,
            minimum_stock: p.minimum_stock,
            is_active: p.is_active,
        }
    }
}

// PATCH /api/products/{id}
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    tag = "Products",
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = ProductDetail),
        (status = 404, description = "Produto ou categoria não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do produto")),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let product = app_state
        .product_service
        .update_product(id, &ProductChanges::from(payload))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

// DELETE /api/products/{id} (desativa, o histórico continua apontando para ele)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    responses(
        (status = 200, description = "Produto desativado", body = ProductDetail),
        (status = 404, description = "Produto não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do produto")),
    security(("api_jwt" = []))
)]
pub async fn deactivate_product(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermProductsManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let product = app_state
        .product_service
        .deactivate_product(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_prices_are_rejected() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "categoryId": Uuid::nil(),
            "name": "Heineken 33cl",
            "unit": "bottle",
            "sellingPrice": -1
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("selling_price"));
    }

    #[test]
    fn omitted_stock_fields_default_to_zero() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "categoryId": Uuid::nil(),
            "name": "Água",
            "unit": "bottle",
            "sellingPrice": 300
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.initial_stock, dec!(0));
        assert_eq!(payload.purchase_price, dec!(0));
    }
}
