// src/handlers/expenses.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::validate_amount,
    },
    config::AppState,
    db::expense_repo::NewExpense,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermExpensesManage, PermExpensesView, RequirePermission},
    },
    models::{
        expenses::{Expense, ExpenseCategory, ExpenseFilter},
        sales::PaymentMethod,
    },
    services::report_service::check_range,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseCategoryPayload {
    #[validate(length(min = 1, max = 100, message = "O nome é obrigatório."))]
    #[schema(example = "Energia")]
    pub name: String,
    pub description: Option<String>,
}

// POST /api/expenses/categories
#[utoipa::path(
    post,
    path = "/api/expenses/categories",
    tag = "Expenses",
    request_body = CreateExpenseCategoryPayload,
    responses(
        (status = 201, description = "Categoria de despesa criada", body = ExpenseCategory),
        (status = 409, description = "Categoria já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermExpensesManage>,
    Json(payload): Json<CreateExpenseCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .expense_service
        .create_category(&payload.name, payload.description.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/expenses/categories
#[utoipa::path(
    get,
    path = "/api/expenses/categories",
    tag = "Expenses",
    responses(
        (status = 200, description = "Categorias de despesa", body = Vec<ExpenseCategory>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermExpensesView>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .expense_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpensePayload {
    pub category_id: Uuid,

    #[validate(length(min = 1, max = 500, message = "A descrição é obrigatória."))]
    #[schema(example = "Conta de luz de outubro")]
    pub description: String,

    #[validate(custom(function = "validate_amount"))]
    #[schema(example = "35000.00")]
    pub amount: Decimal,

    /// Padrão: hoje
    #[schema(value_type = Option<String>, format = Date, example = "2026-10-05")]
    pub expense_date: Option<NaiveDate>,

    pub payment_method: Option<PaymentMethod>,
    pub supplier_id: Option<Uuid>,

    #[validate(length(max = 100))]
    pub receipt_number: Option<String>,

    #[serde(default)]
    pub is_paid: bool,
}

// POST /api/expenses
#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, description = "Despesa lançada", body = Expense),
        (status = 404, description = "Categoria ou fornecedor não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequirePermission<PermExpensesManage>,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let expense = app_state
        .expense_service
        .create_expense(NewExpense {
            category_id: payload.category_id,
            description: &payload.description,
            amount: payload.amount,
            expense_date: payload.expense_date.unwrap_or_else(|| Utc::now().date_naive()),
            payment_method: payload.payment_method,
            supplier_id: payload.supplier_id,
            receipt_number: payload.receipt_number.as_deref(),
            is_paid: payload.is_paid,
            created_by: user.0.id,
        })
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(expense)))
}

// GET /api/expenses
#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    params(ExpenseFilter),
    responses(
        (status = 200, description = "Despesas, mais recentes primeiro", body = Vec<Expense>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermExpensesView>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<impl IntoResponse, ApiError> {
    check_range(filter.from, filter.to).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let expenses = app_state
        .expense_service
        .list_expenses(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(expenses))
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayExpensePayload {
    /// Mantém o método já cadastrado quando ausente
    pub payment_method: Option<PaymentMethod>,
}

// POST /api/expenses/{id}/pay
#[utoipa::path(
    post,
    path = "/api/expenses/{id}/pay",
    tag = "Expenses",
    request_body = PayExpensePayload,
    responses(
        (status = 200, description = "Despesa paga", body = Expense),
        (status = 404, description = "Despesa não encontrada"),
        (status = 409, description = "Despesa já paga")
    ),
    params(("id" = Uuid, Path, description = "ID da despesa")),
    security(("api_jwt" = []))
)]
pub async fn pay_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermExpensesManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayExpensePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let expense = app_state
        .expense_service
        .mark_paid(id, payload.payment_method)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(expense))
}

// DELETE /api/expenses/{id}
#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    tag = "Expenses",
    responses(
        (status = 204, description = "Despesa removida"),
        (status = 404, description = "Despesa não encontrada")
    ),
    params(("id" = Uuid, Path, description = "ID da despesa")),
    security(("api_jwt" = []))
)]
pub async fn delete_expense(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermExpensesManage>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .expense_service
        .delete_expense(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
