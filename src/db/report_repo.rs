// src/db/report_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::reports::{PaymentMethodEntry, SummaryTotals, TopProductEntry},
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn day_totals(&self, date: NaiveDate) -> Result<SummaryTotals, AppError> {
        // Custo = Σ quantidade × custo unitário gravado na hora da venda
        let totals = sqlx::query_as::<_, SummaryTotals>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE s.status = 'PAID') AS paid_sales,
                COUNT(*) FILTER (WHERE s.status = 'PENDING') AS pending_sales,
                COUNT(*) FILTER (WHERE s.status = 'CANCELLED') AS cancelled_sales,
                COALESCE(SUM(s.total_amount) FILTER (WHERE s.status = 'PAID'), 0) AS revenue,
                COALESCE(SUM(c.cost) FILTER (WHERE s.status = 'PAID'), 0) AS cost_of_goods
            FROM sales s
            LEFT JOIN LATERAL (
                SELECT SUM(si.quantity * si.unit_cost) AS cost
                FROM sale_items si
                WHERE si.sale_id = s.id
            ) c ON TRUE
            WHERE s.created_at::date = $1
            "#,
        )
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }

    pub async fn day_expenses(&self, date: NaiveDate) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM expenses WHERE expense_date = $1",
        )
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn top_products(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: i64,
    ) -> Result<Vec<TopProductEntry>, AppError> {
        let rows = sqlx::query_as::<_, TopProductEntry>(
            r#"
            SELECT si.product_id,
                   MAX(si.product_name) AS product_name,
                   SUM(si.quantity) AS quantity_sold,
                   SUM(si.total_price) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.status = 'PAID'
              AND ($1::date IS NULL OR s.created_at::date >= $1)
              AND ($2::date IS NULL OR s.created_at::date <= $2)
            GROUP BY si.product_id
            ORDER BY quantity_sold DESC, revenue DESC
            LIMIT $3
            "#,
        )
            .bind(from)
            .bind(to)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn sales_by_payment_method(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<PaymentMethodEntry>, AppError> {
        let rows = sqlx::query_as::<_, PaymentMethodEntry>(
            r#"
            SELECT payment_method,
                   COUNT(*) AS sales_count,
                   COALESCE(SUM(total_amount), 0) AS total
            FROM sales
            WHERE status = 'PAID'
              AND payment_method IS NOT NULL
              AND ($1::date IS NULL OR created_at::date >= $1)
              AND ($2::date IS NULL OR created_at::date <= $2)
            GROUP BY payment_method
            ORDER BY total DESC
            "#,
        )
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
