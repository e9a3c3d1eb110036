// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_support;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG manda; sem ele, "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar
    let app_state = AppState::new().await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let synced = app_state.rbac_service.sync_catalog().await?;
    tracing::info!("✅ Catálogo de permissões sincronizado ({} permissões)", synced);

    if let (Some(username), Some(password)) = (
        app_state.config.admin_username.as_deref(),
        app_state.config.admin_password.as_deref(),
    ) {
        if let Some(admin) = app_state.auth_service.bootstrap_admin(username, password).await? {
            tracing::info!("👤 Administrador inicial '{}' criado", admin.username);
        }
    }

    let router = app(app_state.clone());

    // Inicia o servidor
    let listener = TcpListener::bind(&app_state.config.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, router).await?;

    Ok(())
}

/// Router completo da API; os testes de rota usam o mesmo.
fn app(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh));

    // Rotas do usuário logado
    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/password", put(handlers::auth::change_my_password));

    let user_routes = Router::new()
        .route(
            "/",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            "/{id}",
            get(handlers::users::get_user).patch(handlers::users::update_user),
        )
        .route("/{id}/password", put(handlers::users::reset_password))
        .route(
            "/{id}/permissions",
            get(handlers::users::get_user_permissions).put(handlers::users::set_user_permissions),
        );

    let product_routes = Router::new()
        .route(
            "/",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route(
            "/{id}",
            get(handlers::products::get_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::deactivate_product),
        );

    let category_routes = Router::new().route(
        "/",
        post(handlers::products::create_category).get(handlers::products::list_categories),
    );

    let inventory_routes = Router::new()
        .route("/adjust", post(handlers::inventory::adjust_stock))
        .route("/movements", get(handlers::inventory::list_movements))
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route("/valuation", get(handlers::inventory::valuation));

    let sales_routes = Router::new()
        .route(
            "/",
            post(handlers::sales::create_sale).get(handlers::sales::list_sales),
        )
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/pay", post(handlers::sales::pay_sale))
        .route("/{id}/cancel", post(handlers::sales::cancel_sale))
        .route("/{id}/receipt", get(handlers::documents::sale_receipt));

    let kitchen_routes = Router::new()
        // Ingredientes
        .route(
            "/ingredients",
            post(handlers::kitchen::create_ingredient).get(handlers::kitchen::list_ingredients),
        )
        .route(
            "/ingredients/{id}",
            get(handlers::kitchen::get_ingredient).patch(handlers::kitchen::update_ingredient),
        )
        .route("/ingredients/{id}/restock", post(handlers::kitchen::restock_ingredient))
        .route("/ingredients/{id}/adjust", post(handlers::kitchen::adjust_ingredient))
        .route("/ingredients/{id}/movements", get(handlers::kitchen::ingredient_movements))
        // Receitas
        .route(
            "/recipes",
            post(handlers::kitchen::create_recipe).get(handlers::kitchen::list_recipes),
        )
        .route("/recipes/recalculate", post(handlers::kitchen::recalculate_all))
        .route(
            "/recipes/{id}",
            get(handlers::kitchen::get_recipe).delete(handlers::kitchen::deactivate_recipe),
        )
        .route("/recipes/{id}/lines", put(handlers::kitchen::replace_recipe_lines))
        .route("/recipes/{id}/consume", post(handlers::kitchen::consume_recipe))
        .route("/recipes/{id}/recalculate", post(handlers::kitchen::recalculate_cost));

    let supplier_routes = Router::new()
        .route(
            "/",
            post(handlers::suppliers::create_supplier).get(handlers::suppliers::list_suppliers),
        )
        .route("/{id}", patch(handlers::suppliers::update_supplier));

    let supply_routes = Router::new()
        .route(
            "/",
            post(handlers::suppliers::create_supply).get(handlers::suppliers::list_supplies),
        )
        .route("/{id}", get(handlers::suppliers::get_supply))
        .route("/{id}/receive", post(handlers::suppliers::receive_supply))
        .route("/{id}/cancel", post(handlers::suppliers::cancel_supply));

    let expense_routes = Router::new()
        .route(
            "/",
            post(handlers::expenses::create_expense).get(handlers::expenses::list_expenses),
        )
        .route(
            "/categories",
            post(handlers::expenses::create_category).get(handlers::expenses::list_categories),
        )
        .route("/{id}", delete(handlers::expenses::delete_expense))
        .route("/{id}/pay", post(handlers::expenses::pay_expense));

    let alert_routes = Router::new()
        .route(
            "/",
            get(handlers::alerts::list_alerts).post(handlers::alerts::create_alert),
        )
        .route("/scan", post(handlers::alerts::scan_alerts))
        .route("/{id}/resolve", post(handlers::alerts::resolve_alert))
        .route("/{id}/archive", post(handlers::alerts::archive_alert));

    let report_routes = Router::new()
        .route("/daily", get(handlers::reports::daily_summary))
        .route("/top-products", get(handlers::reports::top_products))
        .route("/payment-methods", get(handlers::reports::sales_by_payment_method));

    // Tudo o que exige token passa pelo auth_guard
    let protected = Router::new()
        .route("/permissions", get(handlers::rbac::list_permissions))
        .nest("/auth", me_routes)
        .nest("/users", user_routes)
        .nest("/products", product_routes)
        .nest("/categories", category_routes)
        .nest("/inventory", inventory_routes)
        .nest("/sales", sales_routes)
        .nest("/kitchen", kitchen_routes)
        .nest("/suppliers", supplier_routes)
        .nest("/supplies", supply_routes)
        .nest("/expenses", expense_routes)
        .nest("/alerts", alert_routes)
        .nest("/reports", report_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use rust_decimal_macros::dec;
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use tower::ServiceExt;

    use crate::{
        models::sales::PaymentMethod,
        services::sales_service::{NewSale, SaleLineInput},
        test_support,
    };

    // Pool que nunca chega a conectar: serve para rotas que não tocam o banco
    fn offline_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/barstockwise")
            .unwrap();
        AppState::from_pool(pool, test_support::config()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public_and_the_rest_needs_a_token() {
        let router = app(offline_state());

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"OK");

        let response = router
            .oneshot(Request::builder().uri("/api/sales").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn cancelling_a_paid_sale_is_a_conflict(pool: PgPool) {
        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let beer = test_support::product(&state, "Cerveja", dec!(10), dec!(0)).await;

        let sale = state
            .sales_service
            .create_sale(
                NewSale {
                    table_number: Some(2),
                    customer_name: None,
                    discount: dec!(0),
                    notes: None,
                    lines: vec![SaleLineInput { product_id: beer.id, quantity: dec!(3), unit_price: None }],
                },
                admin.id,
            )
            .await
            .unwrap();
        state.sales_service.mark_paid(sale.header.id, PaymentMethod::Cash).await.unwrap();
        let tokens = state
            .auth_service
            .login(test_support::ADMIN_USERNAME, test_support::ADMIN_PASSWORD)
            .await
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/sales/{}/cancel", sale.header.id))
            .header(header::AUTHORIZATION, format!("Bearer {}", tokens.access))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"reason":"Engano no pedido"}"#))
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string());

        // Venda paga segue paga e o estoque não volta
        let sale = state.sales_service.get_sale(sale.header.id).await.unwrap();
        assert_eq!(sale.header.status, crate::models::sales::SaleStatus::Paid);
        let beer = state.product_service.get_product(beer.id).await.unwrap().product;
        assert_eq!(beer.current_stock, dec!(7));
    }
}
