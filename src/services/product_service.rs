// src/services/product_service.rs

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{KitchenRepository, ProductRepository},
    models::{
        alerts::StockSubject,
        products::{Category, Product, ProductChanges, ProductDetail, ProductFilter},
    },
    services::alert_service::AlertService,
};

pub struct NewProduct<'a> {
    pub category_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub unit: &'a str,
    pub purchase_price: Decimal,
    pub selling_price: Decimal,
    pub initial_stock: Decimal,
    pub minimum_stock: Decimal,
}

#[derive(Clone)]
pub struct ProductService {
    repo: ProductRepository,
    kitchen_repo: KitchenRepository,
    alert_service: AlertService,
    pool: PgPool,
}

impl ProductService {
    pub fn new(
        repo: ProductRepository,
        kitchen_repo: KitchenRepository,
        alert_service: AlertService,
        pool: PgPool,
    ) -> Self {
        Self { repo, kitchen_repo, alert_service, pool }
    }

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        self.repo.create_category(name.trim(), description).await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.repo.get_all_categories().await
    }

    pub async fn create_product(&self, new: NewProduct<'_>) -> Result<ProductDetail, AppError> {
        let product = self
            .repo
            .create_product(
                new.category_id,
                new.name.trim(),
                new.description,
                new.unit,
                new.purchase_price,
                new.selling_price,
                new.initial_stock,
                new.minimum_stock,
            )
            .await?;

        // Produto novo já pode nascer abaixo do mínimo
        self.refresh_alert(&product).await?;
        self.detail(product).await
    }

    /// Lista com nome da categoria e marcação de receita, sem N+1.
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductDetail>, AppError> {
        let products = self.repo.list_products(filter).await?;

        let categories: HashMap<Uuid, String> = self
            .repo
            .get_all_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        let with_recipe: HashSet<Uuid> = self
            .kitchen_repo
            .list_active_recipes(&self.pool)
            .await?
            .into_iter()
            .map(|r| r.product_id)
            .collect();

        Ok(products
            .into_iter()
            .map(|p| {
                let category_name = categories.get(&p.category_id).cloned().unwrap_or_default();
                let has_recipe = with_recipe.contains(&p.id);
                ProductDetail::new(p, category_name, has_recipe)
            })
            .collect())
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, AppError> {
        let product = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Product"))?;
        self.detail(product).await
    }

    pub async fn update_product(&self, id: Uuid, changes: &ProductChanges) -> Result<ProductDetail, AppError> {
        let product = self
            .repo
            .update_product(id, changes)
            .await
            .map_err(|e| match e {
                AppError::DatabaseError(sqlx::Error::Database(ref db_err))
                    if db_err.is_foreign_key_violation() =>
                {
                    AppError::NotFound("Category")
                }
                other => other,
            })?
            .ok_or(AppError::NotFound("Product"))?;

        if changes.minimum_stock.is_some() {
            self.refresh_alert(&product).await?;
        }
        self.detail(product).await
    }

    /// Exclusão lógica: o histórico de vendas continua apontando para o produto.
    pub async fn deactivate_product(&self, id: Uuid) -> Result<ProductDetail, AppError> {
        let changes = ProductChanges {
            is_active: Some(false),
            ..Default::default()
        };
        let product = self
            .repo
            .update_product(id, &changes)
            .await?
            .ok_or(AppError::NotFound("Product"))?;
        self.detail(product).await
    }

    async fn refresh_alert(&self, product: &Product) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        self.alert_service
            .evaluate_stock_in(
                &mut *conn,
                StockSubject::Product(product.id),
                &product.name,
                product.current_stock,
                product.minimum_stock,
            )
            .await?;
        Ok(())
    }

    async fn detail(&self, product: Product) -> Result<ProductDetail, AppError> {
        let category_name = self
            .repo
            .category_name(product.category_id)
            .await?
            .unwrap_or_default();
        let has_recipe = self.kitchen_repo.product_has_recipe(product.id).await?;
        Ok(ProductDetail::new(product, category_name, has_recipe))
    }
}
