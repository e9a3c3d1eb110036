// src/test_support.rs
//
// Montagem comum dos testes com banco. Cada `#[sqlx::test]` recebe um banco
// novo, já migrado, a partir de DATABASE_URL.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::{AppState, Config},
    models::{auth::User, kitchen::Ingredient, products::Product},
    services::{kitchen_service::NewRecipe, product_service::NewProduct},
};

pub const ADMIN_USERNAME: &str = "gerente";
pub const ADMIN_PASSWORD: &str = "senha-forte";

pub fn config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "segredo-dos-testes".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        database_max_connections: 2,
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 1,
        admin_username: None,
        admin_password: None,
        business_name: "Bar de Teste".to_string(),
        fonts_dir: "./fonts".to_string(),
    }
}

/// Estado completo com o catálogo de permissões sincronizado.
pub async fn state(pool: PgPool) -> AppState {
    let state = AppState::from_pool(pool, config()).unwrap();
    state.rbac_service.sync_catalog().await.unwrap();
    state
}

pub async fn admin(state: &AppState) -> User {
    state
        .auth_service
        .bootstrap_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .unwrap()
        .unwrap()
}

pub async fn product(state: &AppState, name: &str, stock: Decimal, minimum: Decimal) -> Product {
    let category = state
        .product_service
        .create_category(&format!("Categoria {}", name), None)
        .await
        .unwrap();
    state
        .product_service
        .create_product(NewProduct {
            category_id: category.id,
            name,
            description: None,
            unit: "un",
            purchase_price: Decimal::new(200, 2),
            selling_price: Decimal::new(500, 2),
            initial_stock: stock,
            minimum_stock: minimum,
        })
        .await
        .unwrap()
        .product
}

pub async fn ingredient(state: &AppState, name: &str, stock: Decimal, minimum: Decimal) -> Ingredient {
    state
        .kitchen_service
        .create_ingredient(name, "kg", stock, minimum, Decimal::new(1000, 2))
        .await
        .unwrap()
}

/// Produto com receita de uma linha; devolve (produto, id da receita).
pub async fn dish(state: &AppState, ingredient_id: Uuid, per_portion: Decimal) -> (Product, Uuid) {
    let dish = product(state, "Caipirinha", Decimal::ZERO, Decimal::ZERO).await;
    let recipe = state
        .kitchen_service
        .create_recipe(NewRecipe {
            product_id: dish.id,
            name: "Caipirinha da casa",
            description: None,
            preparation_time: Some(5),
            lines: vec![(ingredient_id, per_portion)],
        })
        .await
        .unwrap();
    (dish, recipe.recipe.id)
}
