// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::products::{Category, Product, ProductChanges, ProductFilter},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Categorias
    // ---

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Category",
                            name: name.to_string(),
                        };
                    }
                }
                e.into()
            })
    }

    pub async fn get_all_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn category_name(&self, id: Uuid) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    // ---
    // Produtos
    // ---

    pub async fn create_product(
        &self,
        category_id: Uuid,
        name: &str,
        description: Option<&str>,
        unit: &str,
        purchase_price: Decimal,
        selling_price: Decimal,
        initial_stock: Decimal,
        minimum_stock: Decimal,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                category_id, name, description, unit,
                purchase_price, selling_price, current_stock, minimum_stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(category_id)
            .bind(name)
            .bind(description)
            .bind(unit)
            .bind(purchase_price)
            .bind(selling_price)
            .bind(initial_stock)
            .bind(minimum_stock)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::NotFound("Category");
                    }
                }
                e.into()
            })
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        // Filtros opcionais: parâmetro NULL desliga a condição
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2::bool IS NULL OR is_active = $2)
              AND ($3::bool IS NOT TRUE OR current_stock <= minimum_stock)
              AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%')
            ORDER BY name ASC
            "#,
        )
            .bind(filter.category_id)
            .bind(filter.is_active)
            .bind(filter.low_stock)
            .bind(filter.search.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Trava a linha do produto até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, changes: &ProductChanges) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                unit = COALESCE($5, unit),
                purchase_price = COALESCE($6, purchase_price),
                selling_price = COALESCE($7, selling_price),
                minimum_stock = COALESCE($8, minimum_stock),
                is_active = COALESCE($9, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(changes.category_id)
            .bind(changes.name.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.unit.as_deref())
            .bind(changes.purchase_price)
            .bind(changes.selling_price)
            .bind(changes.minimum_stock)
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn set_stock<'e, E>(&self, executor: E, id: Uuid, new_stock: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET current_stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(new_stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Entrada de compra: saldo e custo médio juntos.
    pub async fn set_stock_and_cost<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        new_stock: Decimal,
        purchase_price: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE products
            SET current_stock = $2, purchase_price = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(new_stock)
            .bind(purchase_price)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_purchase_price<'e, E>(&self, executor: E, id: Uuid, purchase_price: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET purchase_price = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(purchase_price)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_active<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE is_active = TRUE")
            .fetch_all(executor)
            .await?;
        Ok(products)
    }
}
