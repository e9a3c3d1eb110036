// src/db/sales_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{PaymentMethod, Sale, SaleFilter, SaleItem},
};

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Cabeçalho da venda. O total é gravado depois, quando as linhas já existem.
    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        table_number: Option<i32>,
        customer_name: Option<&str>,
        server_id: Uuid,
        discount_amount: Decimal,
        notes: Option<&str>,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (table_number, customer_name, server_id, discount_amount, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(table_number)
            .bind(customer_name)
            .bind(server_id)
            .bind(discount_amount)
            .bind(notes)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn add_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        product_id: Uuid,
        product_name: &str,
        quantity: Decimal,
        unit_price: Decimal,
        unit_cost: Decimal,
        total_price: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // O total vem calculado (e arredondado) pelo serviço, igual ao que entra no total da venda
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (sale_id, product_id, product_name, quantity, unit_price, unit_cost, total_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(sale_id)
            .bind(product_id)
            .bind(product_name)
            .bind(quantity)
            .bind(unit_price)
            .bind(unit_cost)
            .bind(total_price)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn set_total<'e, E>(&self, executor: E, sale_id: Uuid, total: Decimal) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            "UPDATE sales SET total_amount = $2 WHERE id = $1 RETURNING *",
        )
            .bind(sale_id)
            .bind(total)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, AppError> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT * FROM sales
            WHERE ($1::sale_status IS NULL OR status = $1)
              AND ($2::date IS NULL OR created_at::date >= $2)
              AND ($3::date IS NULL OR created_at::date <= $3)
              AND ($4::uuid IS NULL OR server_id = $4)
            ORDER BY created_at DESC
            "#,
        )
            .bind(filter.status)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.server_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn list_items(&self, sale_id: Uuid) -> Result<Vec<SaleItem>, AppError> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = $1 ORDER BY product_name ASC",
        )
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn server_username(&self, server_id: Uuid) -> Result<Option<String>, AppError> {
        let username = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE id = $1")
            .bind(server_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(username)
    }

    pub async fn mark_paid<'e, E>(&self, executor: E, id: Uuid, method: PaymentMethod) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET status = 'PAID', payment_method = $2, paid_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(method)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn mark_cancelled<'e, E>(&self, executor: E, id: Uuid, reason: Option<&str>) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET status = 'CANCELLED', cancelled_at = NOW(), cancel_reason = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(reason)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }
}
