// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::kitchen::IngredientShortage,
};

// Erro interno da aplicação. Services e repositórios só conhecem este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário desativado")]
    UserInactive,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Usuário '{0}' já existe")]
    UsernameAlreadyExists(String),

    #[error("Permissão '{0}' necessária")]
    PermissionDenied(String),

    #[error("Permissões desconhecidas: {0:?}")]
    UnknownPermissions(Vec<String>),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("{resource} '{name}' já existe")]
    AlreadyExists { resource: &'static str, name: String },

    #[error("Estoque insuficiente para '{product}'")]
    InsufficientStock {
        product: String,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Ingredientes insuficientes")]
    InsufficientIngredients(Vec<IngredientShortage>),

    #[error("Transição inválida de {from} para {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Estoque de '{0}' ficaria negativo")]
    NegativeStock(String),

    #[error("Produto já possui receita")]
    RecipeAlreadyExists,

    #[error("Despesa já paga")]
    ExpenseAlreadyPaid,

    #[error("Pedido sem itens")]
    EmptyOrder,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar documento: {0}")]
    DocumentError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// Erro que sai pela API (já traduzido)
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::UnknownPermissions(_)
            | AppError::EmptyOrder => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::UserInactive | AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UsernameAlreadyExists(_)
            | AppError::AlreadyExists { .. }
            | AppError::InsufficientStock { .. }
            | AppError::InsufficientIngredients(_)
            | AppError::InvalidTransition { .. }
            | AppError::NegativeStock(_)
            | AppError::RecipeAlreadyExists
            | AppError::ExpenseAlreadyPaid => StatusCode::CONFLICT,
            AppError::FontNotFound(_) | AppError::DocumentError(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro interno na resposta da API, no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();
        let t = |key: &str, params: &[(&str, String)]| store.translate(lang, key, params);

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut fields: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    fields.insert(field.to_string(), messages);
                }
                (t("validation_failed", &[]), Some(json!(fields)))
            }
            AppError::InvalidCredentials => (t("invalid_credentials", &[]), None),
            AppError::InvalidToken => (t("invalid_token", &[]), None),
            AppError::UserInactive => (t("user_inactive", &[]), None),
            AppError::UserNotFound => (t("user_not_found", &[]), None),
            AppError::UsernameAlreadyExists(username) => {
                (t("username_taken", &[("username", username)]), None)
            }
            AppError::PermissionDenied(code) => {
                (t("permission_denied", &[("permission", code)]), None)
            }
            AppError::UnknownPermissions(codes) => (
                t("unknown_permissions", &[("codes", codes.join(", "))]),
                Some(json!(codes)),
            ),
            AppError::NotFound(resource) => {
                (t("not_found", &[("resource", resource.to_string())]), None)
            }
            AppError::AlreadyExists { resource, name } => (
                t("already_exists", &[("resource", resource.to_string()), ("name", name)]),
                None,
            ),
            AppError::InsufficientStock {
                product,
                available,
                requested,
            } => (
                t(
                    "insufficient_stock",
                    &[
                        ("product", product.clone()),
                        ("available", available.normalize().to_string()),
                        ("requested", requested.normalize().to_string()),
                    ],
                ),
                Some(json!({
                    "product": product,
                    "available": available,
                    "requested": requested,
                })),
            ),
            AppError::InsufficientIngredients(shortages) => {
                (t("insufficient_ingredients", &[]), Some(json!(shortages)))
            }
            AppError::InvalidTransition { from, to } => {
                (t("invalid_transition", &[("from", from), ("to", to)]), None)
            }
            AppError::NegativeStock(name) => (t("negative_stock", &[("name", name)]), None),
            AppError::RecipeAlreadyExists => (t("recipe_exists", &[]), None),
            AppError::ExpenseAlreadyPaid => (t("expense_already_paid", &[]), None),
            AppError::EmptyOrder => (t("empty_order", &[]), None),
            ref e @ (AppError::FontNotFound(_) | AppError::DocumentError(_)) => {
                tracing::error!("Falha ao gerar documento: {}", e);
                (t("document_unavailable", &[]), None)
            }
            // Banco, JWT, bcrypt e afins: loga o detalhe, devolve mensagem genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (t("internal_error", &[]), None)
            }
        };

        ApiError {
            status,
            error,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn en() -> Locale {
        Locale("en".into())
    }

    #[test]
    fn stock_errors_map_to_conflict_with_details() {
        let store = I18nStore::load().unwrap();
        let err = AppError::InsufficientStock {
            product: "Beer".into(),
            available: dec!(2.000),
            requested: dec!(5),
        };
        let api = err.to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(
            api.error,
            "Insufficient stock for 'Beer': 2 available, 5 requested."
        );
        assert!(api.details.is_some());
    }

    #[test]
    fn shortages_are_listed_in_details() {
        let store = I18nStore::load().unwrap();
        let err = AppError::InsufficientIngredients(vec![IngredientShortage {
            ingredient_id: Uuid::nil(),
            name: "Lime".into(),
            required: dec!(3),
            available: dec!(1),
        }]);
        let api = err.to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        let details = api.details.unwrap();
        assert_eq!(details[0]["name"], "Lime");
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let store = I18nStore::load().unwrap();
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 1234"));
        let api = err.to_api_error(&Locale("pt".into()), &store);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "Ocorreu um erro inesperado.");
    }

    #[test]
    fn auth_errors_have_expected_status() {
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::PermissionDenied("sales_manage".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::NotFound("Sale").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmptyOrder.status(), StatusCode::BAD_REQUEST);
    }
}
