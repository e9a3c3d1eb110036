// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn code() -> &'static str;
}

/// Entrada do catálogo estático. Sincronizada com a tabela `permissions` no boot.
#[derive(Debug)]
pub struct PermissionSpec {
    pub code: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
}

inventory::collect!(PermissionSpec);

/// Catálogo completo, ordenado por categoria e código.
pub fn catalog() -> Vec<&'static PermissionSpec> {
    let mut specs: Vec<&'static PermissionSpec> = inventory::iter::<PermissionSpec>.into_iter().collect();
    specs.sort_by(|a, b| (a.category, a.code).cmp(&(b.category, b.code)));
    specs
}

pub fn is_known(code: &str) -> bool {
    inventory::iter::<PermissionSpec>
        .into_iter()
        .any(|spec| spec.code == code)
}

// Declara o tipo e registra no catálogo de uma vez
macro_rules! permission {
    ($ty:ident, $code:literal, $category:literal, $name:literal, $description:literal) => {
        pub struct $ty;

        impl PermissionDef for $ty {
            fn code() -> &'static str {
                $code
            }
        }

        inventory::submit! {
            PermissionSpec {
                code: $code,
                name: $name,
                category: $category,
                description: $description,
            }
        }
    };
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);

        // A. Usuário colocado nas extensions pelo auth_guard
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Resolve a permissão (admin passa direto)
        let required = T::code();
        let allowed = app_state
            .rbac_service
            .user_can(&user.0, required)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        if !allowed {
            tracing::warn!("Acesso negado: '{}' sem '{}'", user.0.username, required);
            return Err(AppError::PermissionDenied(required.to_string())
                .to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

permission!(PermUsersManage, "users_manage", "users", "Gerenciar usuários", "Criar, editar e desativar usuários e suas permissões");

permission!(PermProductsView, "products_view", "products", "Ver produtos", "Consultar produtos e categorias");
permission!(PermProductsManage, "products_manage", "products", "Gerenciar produtos", "Criar e editar produtos e categorias");

permission!(PermSalesView, "sales_view", "sales", "Ver vendas", "Consultar vendas e recibos");
permission!(PermSalesCreate, "sales_create", "sales", "Registrar vendas", "Abrir novas vendas");
permission!(PermSalesManage, "sales_manage", "sales", "Gerenciar vendas", "Receber pagamento e cancelar vendas");

permission!(PermInventoryView, "inventory_view", "inventory", "Ver estoque", "Consultar movimentações e valorização do estoque");
permission!(PermInventoryManage, "inventory_manage", "inventory", "Ajustar estoque", "Fazer ajustes e registrar perdas");

permission!(PermKitchenView, "kitchen_view", "kitchen", "Ver cozinha", "Consultar ingredientes e receitas");
permission!(PermKitchenManage, "kitchen_manage", "kitchen", "Gerenciar cozinha", "Editar ingredientes e receitas, repor e recalcular custos");

permission!(PermSuppliersView, "suppliers_view", "suppliers", "Ver fornecedores", "Consultar fornecedores e pedidos de compra");
permission!(PermSuppliersManage, "suppliers_manage", "suppliers", "Gerenciar fornecedores", "Cadastrar fornecedores e receber pedidos de compra");

permission!(PermExpensesView, "expenses_view", "expenses", "Ver despesas", "Consultar despesas");
permission!(PermExpensesManage, "expenses_manage", "expenses", "Gerenciar despesas", "Lançar, pagar e excluir despesas");

permission!(PermAlertsView, "alerts_view", "alerts", "Ver alertas", "Consultar alertas de estoque");
permission!(PermAlertsManage, "alerts_manage", "alerts", "Gerenciar alertas", "Resolver, arquivar e criar alertas");

permission!(PermReportsView, "reports_view", "reports", "Ver relatórios", "Consultar resumo diário e rankings");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_codes_are_unique() {
        let specs = catalog();
        let codes: HashSet<&str> = specs.iter().map(|s| s.code).collect();
        assert_eq!(codes.len(), specs.len());
        assert_eq!(specs.len(), 17);
    }

    #[test]
    fn type_codes_are_registered() {
        assert!(is_known(PermSalesCreate::code()));
        assert!(is_known(PermUsersManage::code()));
        assert!(!is_known("crm:read"));
    }

    #[test]
    fn catalog_is_sorted_by_category() {
        let specs = catalog();
        assert_eq!(specs[0].category, "alerts");
        assert!(specs.windows(2).all(|w| w[0].category <= w[1].category));
    }
}
