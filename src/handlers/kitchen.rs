// src/handlers/kitchen.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{
            validate_cost, validate_ingredient_delta, validate_ingredient_level,
            validate_ingredient_quantity, validate_quantity,
        },
    },
    config::AppState,
    db::kitchen_repo::IngredientChanges,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermKitchenManage, PermKitchenView, RequirePermission},
    },
    models::kitchen::{
        Ingredient, IngredientMovement, IngredientMovementType, Recipe, RecipeCost, RecipeDetail,
        RestockOutcome,
    },
    services::kitchen_service::NewRecipe,
};

// =============================================================================
//  1. INGREDIENTES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngredientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[schema(example = "Limão")]
    pub name: String,

    #[validate(length(min = 1, max = 20, message = "A unidade é obrigatória."))]
    #[schema(example = "kg")]
    pub unit: String,

    #[validate(custom(function = "validate_ingredient_level"))]
    #[serde(default)]
    pub initial_stock: Decimal,

    #[validate(custom(function = "validate_ingredient_level"))]
    #[serde(default)]
    pub minimum_stock: Decimal,

    #[validate(custom(function = "validate_cost"))]
    #[serde(default)]
    pub unit_price: Decimal,
}

// POST /api/kitchen/ingredients
#[utoipa::path(
    post,
    path = "/api/kitchen/ingredients",
    tag = "Kitchen",
    request_body = CreateIngredientPayload,
    responses(
        (status = 201, description = "Ingrediente criado", body = Ingredient),
        (status = 409, description = "Ingrediente já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Json(payload): Json<CreateIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let ingredient = app_state
        .kitchen_service
        .create_ingredient(
            &payload.name,
            &payload.unit,
            payload.initial_stock,
            payload.minimum_stock,
            payload.unit_price,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    /// Inclui ingredientes desativados
    #[serde(default)]
    pub include_inactive: bool,
}

// GET /api/kitchen/ingredients
#[utoipa::path(
    get,
    path = "/api/kitchen/ingredients",
    tag = "Kitchen",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Ingredientes", body = Vec<Ingredient>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_ingredients(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenView>,
    Query(query): Query<IngredientListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredients = app_state
        .kitchen_service
        .list_ingredients(!query.include_inactive)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredients))
}

// GET /api/kitchen/ingredients/{id}
#[utoipa::path(
    get,
    path = "/api/kitchen/ingredients/{id}",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Ingrediente", body = Ingredient),
        (status = 404, description = "Ingrediente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do ingrediente")),
    security(("api_jwt" = []))
)]
pub async fn get_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredient = app_state
        .kitchen_service
        .get_ingredient(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredient))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIngredientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "A unidade não pode ficar vazia."))]
    pub unit: Option<String>,
    #[validate(custom(function = "validate_ingredient_level"))]
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

// PATCH /api/kitchen/ingredients/{id}
#[utoipa::path(
    patch,
    path = "/api/kitchen/ingredients/{id}",
    tag = "Kitchen",
    request_body = UpdateIngredientPayload,
    responses(
        (status = 200, description = "Ingrediente atualizado", body = Ingredient),
        (status = 404, description = "Ingrediente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do ingrediente")),
    security(("api_jwt" = []))
)]
pub async fn update_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = IngredientChanges {
        name: payload.name,
        unit: payload.unit,
        minimum_stock: payload.minimum_stock,
        is_active: payload.is_active,
    };

    let ingredient = app_state
        .kitchen_service
        .update_ingredient(id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(ingredient))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockPayload {
    #[validate(custom(function = "validate_ingredient_quantity"))]
    #[schema(example = "5")]
    pub quantity: Decimal,

    /// Custo unitário desta entrada
    #[validate(custom(function = "validate_cost"))]
    #[schema(example = "1200.00")]
    pub unit_price: Decimal,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// POST /api/kitchen/ingredients/{id}/restock
#[utoipa::path(
    post,
    path = "/api/kitchen/ingredients/{id}/restock",
    tag = "Kitchen",
    request_body = RestockPayload,
    responses(
        (status = 200, description = "Estoque reposto e custos das receitas recalculados", body = RestockOutcome),
        (status = 404, description = "Ingrediente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID do ingrediente")),
    security(("api_jwt" = []))
)]
pub async fn restock_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RestockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .kitchen_service
        .restock(id, payload.quantity, payload.unit_price, payload.reason.as_deref(), user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}

fn default_ingredient_adjustment() -> IngredientMovementType {
    IngredientMovementType::Adjustment
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustIngredientPayload {
    /// Variação com sinal
    #[validate(custom(function = "validate_ingredient_delta"))]
    #[schema(example = "-0.5")]
    pub delta: Decimal,

    #[serde(default = "default_ingredient_adjustment")]
    pub movement_type: IngredientMovementType,

    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// POST /api/kitchen/ingredients/{id}/adjust
#[utoipa::path(
    post,
    path = "/api/kitchen/ingredients/{id}/adjust",
    tag = "Kitchen",
    request_body = AdjustIngredientPayload,
    responses(
        (status = 201, description = "Ajuste registrado", body = IngredientMovement),
        (status = 409, description = "O estoque ficaria negativo")
    ),
    params(("id" = Uuid, Path, description = "ID do ingrediente")),
    security(("api_jwt" = []))
)]
pub async fn adjust_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .kitchen_service
        .adjust_ingredient(id, payload.delta, payload.movement_type, payload.reason.as_deref(), user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Padrão 100, máximo 500
    pub limit: Option<i64>,
}

// GET /api/kitchen/ingredients/{id}/movements
#[utoipa::path(
    get,
    path = "/api/kitchen/ingredients/{id}/movements",
    tag = "Kitchen",
    params(
        ("id" = Uuid, Path, description = "ID do ingrediente"),
        LimitQuery
    ),
    responses(
        (status = 200, description = "Movimentos do ingrediente", body = Vec<IngredientMovement>)
    ),
    security(("api_jwt" = []))
)]
pub async fn ingredient_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenView>,
    Path(id): Path<Uuid>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .kitchen_service
        .ingredient_movements(id, query.limit)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movements))
}

// =============================================================================
//  2. RECEITAS
// =============================================================================

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLinePayload {
    pub ingredient_id: Uuid,
    #[validate(custom(function = "validate_ingredient_quantity"))]
    #[schema(example = "0.05")]
    pub quantity_per_portion: Decimal,
}

fn to_lines(lines: &[RecipeLinePayload]) -> Vec<(Uuid, Decimal)> {
    lines
        .iter()
        .map(|l| (l.ingredient_id, l.quantity_per_portion))
        .collect()
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipePayload {
    pub product_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "O nome é obrigatório."))]
    #[schema(example = "Mojito clássico")]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Tempo de preparo inválido."))]
    pub preparation_time: Option<i32>,

    #[validate(length(min = 1, message = "A receita precisa de ao menos um ingrediente."))]
    #[validate(nested)]
    pub lines: Vec<RecipeLinePayload>,
}

// POST /api/kitchen/recipes
#[utoipa::path(
    post,
    path = "/api/kitchen/recipes",
    tag = "Kitchen",
    request_body = CreateRecipePayload,
    responses(
        (status = 201, description = "Receita criada e custo do produto calculado", body = RecipeDetail),
        (status = 404, description = "Produto ou ingrediente não encontrado"),
        (status = 409, description = "O produto já possui receita")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_recipe(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Json(payload): Json<CreateRecipePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let recipe = app_state
        .kitchen_service
        .create_recipe(NewRecipe {
            product_id: payload.product_id,
            name: &payload.name,
            description: payload.description.as_deref(),
            preparation_time: payload.preparation_time,
            lines: to_lines(&payload.lines),
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

// GET /api/kitchen/recipes
#[utoipa::path(
    get,
    path = "/api/kitchen/recipes",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Receitas", body = Vec<Recipe>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_recipes(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenView>,
) -> Result<impl IntoResponse, ApiError> {
    let recipes = app_state
        .kitchen_service
        .list_recipes()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(recipes))
}

// GET /api/kitchen/recipes/{id}
#[utoipa::path(
    get,
    path = "/api/kitchen/recipes/{id}",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Receita com ingredientes e custo por porção", body = RecipeDetail),
        (status = 404, description = "Receita não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da receita")),
    security(("api_jwt" = []))
)]
pub async fn get_recipe(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenView>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = app_state
        .kitchen_service
        .get_recipe(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(recipe))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceLinesPayload {
    #[validate(length(min = 1, message = "A receita precisa de ao menos um ingrediente."))]
    #[validate(nested)]
    pub lines: Vec<RecipeLinePayload>,
}

// PUT /api/kitchen/recipes/{id}/lines
#[utoipa::path(
    put,
    path = "/api/kitchen/recipes/{id}/lines",
    tag = "Kitchen",
    request_body = ReplaceLinesPayload,
    responses(
        (status = 200, description = "Ingredientes substituídos", body = RecipeDetail),
        (status = 404, description = "Receita ou ingrediente não encontrado")
    ),
    params(("id" = Uuid, Path, description = "ID da receita")),
    security(("api_jwt" = []))
)]
pub async fn replace_recipe_lines(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplaceLinesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let recipe = app_state
        .kitchen_service
        .replace_recipe_lines(id, to_lines(&payload.lines))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(recipe))
}

// DELETE /api/kitchen/recipes/{id}
#[utoipa::path(
    delete,
    path = "/api/kitchen/recipes/{id}",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Receita desativada", body = Recipe),
        (status = 404, description = "Receita não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da receita")),
    security(("api_jwt" = []))
)]
pub async fn deactivate_recipe(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = app_state
        .kitchen_service
        .deactivate_recipe(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(recipe))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumePayload {
    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "3")]
    pub portions: Decimal,
}

// POST /api/kitchen/recipes/{id}/consume (preparo sem venda)
#[utoipa::path(
    post,
    path = "/api/kitchen/recipes/{id}/consume",
    tag = "Kitchen",
    request_body = ConsumePayload,
    responses(
        (status = 201, description = "Ingredientes baixados", body = Vec<IngredientMovement>),
        (status = 409, description = "Ingredientes insuficientes (lista completa em details)")
    ),
    params(("id" = Uuid, Path, description = "ID da receita")),
    security(("api_jwt" = []))
)]
pub async fn consume_recipe(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConsumePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movements = app_state
        .kitchen_service
        .consume(id, payload.portions, user.0.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movements)))
}

// POST /api/kitchen/recipes/{id}/recalculate
#[utoipa::path(
    post,
    path = "/api/kitchen/recipes/{id}/recalculate",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Custo recalculado e gravado no produto", body = RecipeCost),
        (status = 404, description = "Receita não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da receita")),
    security(("api_jwt" = []))
)]
pub async fn recalculate_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cost = app_state
        .kitchen_service
        .recalculate_cost(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cost))
}

// POST /api/kitchen/recipes/recalculate
#[utoipa::path(
    post,
    path = "/api/kitchen/recipes/recalculate",
    tag = "Kitchen",
    responses(
        (status = 200, description = "Custos de todas as receitas ativas", body = Vec<RecipeCost>)
    ),
    security(("api_jwt" = []))
)]
pub async fn recalculate_all(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermKitchenManage>,
) -> Result<impl IntoResponse, ApiError> {
    let costs = app_state
        .kitchen_service
        .recalculate_all()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(costs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_lines_keep_payload_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let payload: ReplaceLinesPayload = serde_json::from_value(serde_json::json!({
            "lines": [
                { "ingredientId": a, "quantityPerPortion": 0.05 },
                { "ingredientId": b, "quantityPerPortion": 2 }
            ]
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        let lines = to_lines(&payload.lines);
        assert_eq!(lines[0].0, a);
        assert_eq!(lines[1].1, Decimal::from(2));
    }

    #[test]
    fn ingredient_quantities_keep_four_decimals() {
        let payload: RestockPayload = serde_json::from_value(serde_json::json!({
            "quantity": 0.00005,
            "unitPrice": 10
        }))
        .unwrap();
        assert!(payload.validate().is_err());

        let payload: AdjustIngredientPayload =
            serde_json::from_value(serde_json::json!({ "delta": -0.00001 })).unwrap();
        assert!(payload.validate().is_err());

        let payload: RestockPayload = serde_json::from_value(serde_json::json!({
            "quantity": 0.0005,
            "unitPrice": 1200.5
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn adjustment_type_defaults_to_adjustment() {
        let payload: AdjustIngredientPayload =
            serde_json::from_value(serde_json::json!({ "delta": -1 })).unwrap();
        assert_eq!(payload.movement_type, IngredientMovementType::Adjustment);
    }
}
