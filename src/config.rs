// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        AlertRepository, ExpenseRepository, InventoryRepository, KitchenRepository, ProductRepository,
        RbacRepository, ReportRepository, SalesRepository, SupplierRepository, UserRepository,
    },
    services::{
        alert_service::AlertService,
        auth::{AuthService, TokenIssuer},
        document_service::DocumentService,
        expense_service::ExpenseService,
        inventory_service::InventoryService,
        kitchen_service::KitchenService,
        product_service::ProductService,
        rbac_service::RbacService,
        report_service::ReportService,
        sales_service::SalesService,
        supplier_service::SupplierService,
    },
};

/// Configuração lida do ambiente (.env em desenvolvimento).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub database_max_connections: u32,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub business_name: String,
    pub fonts_dir: String,
}

fn parse_var<T: FromStr>(name: &str, raw: Option<&str>, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ('{}'): {}", name, raw, e)),
        None => Ok(default),
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    parse_var(name, env::var(name).ok().as_deref(), default)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:3000".to_string())?,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            access_token_ttl_minutes: var_or("ACCESS_TOKEN_TTL_MINUTES", 60)?,
            refresh_token_ttl_days: var_or("REFRESH_TOKEN_TTL_DAYS", 7)?,
            admin_username: optional_var("ADMIN_USERNAME"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            business_name: var_or("BUSINESS_NAME", "BarStockWise".to_string())?,
            fonts_dir: var_or("FONTS_DIR", "./fonts".to_string())?,
        })
    }
}

// O estado compartilhado por todos os handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub product_service: ProductService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub kitchen_service: KitchenService,
    pub supplier_service: SupplierService,
    pub expense_service: ExpenseService,
    pub alert_service: AlertService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        // Se falhar, retorna um Err em vez de dar panic
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(db_pool, config)
    }

    /// Monta os serviços sobre um pool já aberto (o `#[sqlx::test]` entrega o seu).
    pub fn from_pool(db_pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let kitchen_repo = KitchenRepository::new(db_pool.clone());
        let supplier_repo = SupplierRepository::new(db_pool.clone());
        let expense_repo = ExpenseRepository::new(db_pool.clone());
        let alert_repo = AlertRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let alert_service = AlertService::new(
            alert_repo,
            product_repo.clone(),
            kitchen_repo.clone(),
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo, user_repo.clone(), db_pool.clone());
        let tokens = TokenIssuer::new(
            config.jwt_secret.clone(),
            chrono::Duration::minutes(config.access_token_ttl_minutes),
            chrono::Duration::days(config.refresh_token_ttl_days),
        );
        let auth_service = AuthService::new(user_repo, rbac_service.clone(), tokens, db_pool.clone());

        let product_service = ProductService::new(
            product_repo.clone(),
            kitchen_repo.clone(),
            alert_service.clone(),
            db_pool.clone(),
        );
        let inventory_service = InventoryService::new(
            inventory_repo.clone(),
            product_repo.clone(),
            alert_service.clone(),
            db_pool.clone(),
        );
        let kitchen_service = KitchenService::new(
            kitchen_repo.clone(),
            product_repo.clone(),
            alert_service.clone(),
            db_pool.clone(),
        );
        let sales_service = SalesService::new(
            sales_repo,
            product_repo.clone(),
            inventory_repo,
            kitchen_repo,
            inventory_service.clone(),
            kitchen_service.clone(),
            db_pool.clone(),
        );
        let supplier_service = SupplierService::new(
            supplier_repo,
            product_repo,
            inventory_service.clone(),
            db_pool.clone(),
        );
        let expense_service = ExpenseService::new(expense_repo);
        let report_service = ReportService::new(report_repo);
        let document_service = DocumentService::new(config.business_name.clone(), config.fonts_dir.clone());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(i18n_store),
            auth_service,
            rbac_service,
            product_service,
            inventory_service,
            sales_service,
            kitchen_service,
            supplier_service,
            expense_service,
            alert_service,
            report_service,
            document_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value: u32 = parse_var("DATABASE_MAX_CONNECTIONS", None, 5).unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn malformed_variable_is_an_error() {
        let result: anyhow::Result<u32> = parse_var("DATABASE_MAX_CONNECTIONS", Some("cinco"), 5);
        assert!(result.is_err());
        let padded: i64 = parse_var("ACCESS_TOKEN_TTL_MINUTES", Some(" 15 "), 60).unwrap();
        assert_eq!(padded, 15);
    }
}
