// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{StockMovement, StockMovementType, StockValuation},
};

// Dados de uma linha do livro-razão antes de gravar
pub struct NewStockMovement<'a> {
    pub product_id: Uuid,
    pub movement_type: StockMovementType,
    pub quantity: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit_price: Option<Decimal>,
    pub sale_id: Option<Uuid>,
    pub supply_id: Option<Uuid>,
    pub notes: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        movement: NewStockMovement<'_>,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                product_id, movement_type, quantity, stock_before, stock_after,
                unit_price, sale_id, supply_id, notes, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(movement.product_id)
            .bind(movement.movement_type)
            .bind(movement.quantity)
            .bind(movement.stock_before)
            .bind(movement.stock_after)
            .bind(movement.unit_price)
            .bind(movement.sale_id)
            .bind(movement.supply_id)
            .bind(movement.notes)
            .bind(movement.user_id)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_movements(&self, product_id: Option<Uuid>, limit: i64) -> Result<Vec<StockMovement>, AppError> {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
            .bind(product_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Saídas de estoque geradas por uma venda (para estorno).
    pub async fn sale_outflows<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE sale_id = $1 AND movement_type = 'SALE'
            ORDER BY created_at ASC
            "#,
        )
            .bind(sale_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn valuation(&self) -> Result<StockValuation, AppError> {
        let (products_value, low_stock_products): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(GREATEST(current_stock, 0) * purchase_price), 0),
                   COUNT(*) FILTER (WHERE current_stock <= minimum_stock)
            FROM products
            WHERE is_active = TRUE
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        let (ingredients_value, low_stock_ingredients): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(GREATEST(current_stock, 0) * unit_price), 0),
                   COUNT(*) FILTER (WHERE current_stock <= minimum_stock)
            FROM ingredients
            WHERE is_active = TRUE
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        Ok(StockValuation {
            products_value: products_value.round_dp(2),
            ingredients_value: ingredients_value.round_dp(2),
            total_value: (products_value + ingredients_value).round_dp(2),
            low_stock_products,
            low_stock_ingredients,
        })
    }
}
