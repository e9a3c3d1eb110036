// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::get_me,
        handlers::auth::change_my_password,

        // --- Users ---
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::reset_password,
        handlers::users::get_user_permissions,
        handlers::users::set_user_permissions,

        // --- RBAC ---
        handlers::rbac::list_permissions,

        // --- Products ---
        handlers::products::create_category,
        handlers::products::list_categories,
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::deactivate_product,

        // --- Inventory ---
        handlers::inventory::adjust_stock,
        handlers::inventory::list_movements,
        handlers::inventory::low_stock,
        handlers::inventory::valuation,

        // --- Sales ---
        handlers::sales::create_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::pay_sale,
        handlers::sales::cancel_sale,
        handlers::documents::sale_receipt,

        // --- Kitchen ---
        handlers::kitchen::create_ingredient,
        handlers::kitchen::list_ingredients,
        handlers::kitchen::get_ingredient,
        handlers::kitchen::update_ingredient,
        handlers::kitchen::restock_ingredient,
        handlers::kitchen::adjust_ingredient,
        handlers::kitchen::ingredient_movements,
        handlers::kitchen::create_recipe,
        handlers::kitchen::list_recipes,
        handlers::kitchen::get_recipe,
        handlers::kitchen::replace_recipe_lines,
        handlers::kitchen::deactivate_recipe,
        handlers::kitchen::consume_recipe,
        handlers::kitchen::recalculate_cost,
        handlers::kitchen::recalculate_all,

        // --- Suppliers ---
        handlers::suppliers::create_supplier,
        handlers::suppliers::list_suppliers,
        handlers::suppliers::update_supplier,
        handlers::suppliers::create_supply,
        handlers::suppliers::list_supplies,
        handlers::suppliers::get_supply,
        handlers::suppliers::receive_supply,
        handlers::suppliers::cancel_supply,

        // --- Expenses ---
        handlers::expenses::create_category,
        handlers::expenses::list_categories,
        handlers::expenses::create_expense,
        handlers::expenses::list_expenses,
        handlers::expenses::pay_expense,
        handlers::expenses::delete_expense,

        // --- Alerts ---
        handlers::alerts::list_alerts,
        handlers::alerts::create_alert,
        handlers::alerts::resolve_alert,
        handlers::alerts::archive_alert,
        handlers::alerts::scan_alerts,

        // --- Reports ---
        handlers::reports::daily_summary,
        handlers::reports::top_products,
        handlers::reports::sales_by_payment_method,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginPayload,
            models::auth::RefreshPayload,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::ChangePasswordPayload,
            models::auth::TokenPair,

            // --- RBAC ---
            models::rbac::Permission,
            models::rbac::PermissionGroup,
            models::rbac::SetUserPermissionsPayload,
            models::rbac::UserPermissionsResponse,

            // --- Products ---
            models::products::Category,
            models::products::Product,
            models::products::ProductDetail,
            handlers::products::CreateCategoryPayload,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,

            // --- Inventory ---
            models::inventory::StockMovementType,
            models::inventory::StockMovement,
            models::inventory::StockValuation,
            handlers::inventory::AdjustStockPayload,

            // --- Sales ---
            models::sales::SaleStatus,
            models::sales::PaymentMethod,
            models::sales::Sale,
            models::sales::SaleItem,
            models::sales::SaleDetail,
            handlers::sales::SaleLinePayload,
            handlers::sales::CreateSalePayload,
            handlers::sales::PaySalePayload,
            handlers::sales::CancelSalePayload,

            // --- Kitchen ---
            models::kitchen::Ingredient,
            models::kitchen::IngredientMovementType,
            models::kitchen::IngredientMovement,
            models::kitchen::Recipe,
            models::kitchen::RecipeLine,
            models::kitchen::RecipeDetail,
            models::kitchen::IngredientShortage,
            models::kitchen::CostLine,
            models::kitchen::RecipeCost,
            models::kitchen::RestockOutcome,
            handlers::kitchen::CreateIngredientPayload,
            handlers::kitchen::UpdateIngredientPayload,
            handlers::kitchen::RestockPayload,
            handlers::kitchen::AdjustIngredientPayload,
            handlers::kitchen::RecipeLinePayload,
            handlers::kitchen::CreateRecipePayload,
            handlers::kitchen::ReplaceLinesPayload,
            handlers::kitchen::ConsumePayload,

            // --- Suppliers ---
            models::suppliers::Supplier,
            models::suppliers::SupplyStatus,
            models::suppliers::Supply,
            models::suppliers::SupplyItem,
            models::suppliers::SupplyDetail,
            handlers::suppliers::CreateSupplierPayload,
            handlers::suppliers::UpdateSupplierPayload,
            handlers::suppliers::SupplyLinePayload,
            handlers::suppliers::CreateSupplyPayload,

            // --- Expenses ---
            models::expenses::ExpenseCategory,
            models::expenses::Expense,
            handlers::expenses::CreateExpenseCategoryPayload,
            handlers::expenses::CreateExpensePayload,
            handlers::expenses::PayExpensePayload,

            // --- Alerts ---
            models::alerts::AlertType,
            models::alerts::AlertPriority,
            models::alerts::AlertStatus,
            models::alerts::Alert,
            models::alerts::ScanReport,
            handlers::alerts::CreateAlertPayload,

            // --- Reports ---
            models::reports::DailySummary,
            models::reports::TopProductEntry,
            models::reports::PaymentMethodEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Login, refresh e dados do usuário logado"),
        (name = "Users", description = "Gestão de usuários e suas permissões"),
        (name = "RBAC", description = "Catálogo de permissões"),
        (name = "Products", description = "Produtos vendáveis e categorias"),
        (name = "Inventory", description = "Livro-razão do estoque de produtos"),
        (name = "Sales", description = "Vendas, pagamentos, cancelamentos e recibos"),
        (name = "Kitchen", description = "Ingredientes, receitas e custo por porção"),
        (name = "Suppliers", description = "Fornecedores e pedidos de compra"),
        (name = "Expenses", description = "Despesas do estabelecimento"),
        (name = "Alerts", description = "Alertas de estoque e avisos manuais"),
        (name = "Reports", description = "Resumo diário e rankings")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_protected_route_uses_the_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/sales/{id}/receipt"));
        assert!(doc.paths.paths.contains_key("/api/kitchen/recipes/recalculate"));
    }
}
