// src/db/alert_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::alerts::{Alert, AlertFilter, AlertPriority, AlertStatus, AlertType, StockSubject},
};

#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_alert<'e, E>(
        &self,
        executor: E,
        alert_type: AlertType,
        priority: AlertPriority,
        title: &str,
        message: &str,
        subject: Option<StockSubject>,
    ) -> Result<Alert, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alert = sqlx::query_as::<_, Alert>(
            r#"
            INSERT INTO alerts (alert_type, priority, title, message, product_id, ingredient_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(alert_type)
            .bind(priority)
            .bind(title)
            .bind(message)
            .bind(subject.and_then(StockSubject::product_id))
            .bind(subject.and_then(StockSubject::ingredient_id))
            .fetch_one(executor)
            .await?;
        Ok(alert)
    }

    /// Alerta de estoque ativo do item, se houver (o mais grave).
    pub async fn find_active_stock_alert<'e, E>(&self, executor: E, subject: StockSubject) -> Result<Option<Alert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE status = 'ACTIVE'
              AND alert_type IN ('LOW_STOCK', 'OUT_OF_STOCK')
              AND product_id IS NOT DISTINCT FROM $1
              AND ingredient_id IS NOT DISTINCT FROM $2
            ORDER BY priority DESC, created_at DESC
            LIMIT 1
            "#,
        )
            .bind(subject.product_id())
            .bind(subject.ingredient_id())
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn reclassify<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        alert_type: AlertType,
        priority: AlertPriority,
        title: &str,
        message: &str,
    ) -> Result<Alert, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Alert>(
            r#"
            UPDATE alerts SET alert_type = $2, priority = $3, title = $4, message = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(alert_type)
            .bind(priority)
            .bind(title)
            .bind(message)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    /// Resolve automaticamente os alertas de estoque de um item. Retorna quantos.
    pub async fn resolve_stock_alerts<'e, E>(&self, executor: E, subject: StockSubject) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE alerts SET status = 'RESOLVED', resolved_at = NOW()
            WHERE status = 'ACTIVE'
              AND alert_type IN ('LOW_STOCK', 'OUT_OF_STOCK')
              AND product_id IS NOT DISTINCT FROM $1
              AND ingredient_id IS NOT DISTINCT FROM $2
            "#,
        )
            .bind(subject.product_id())
            .bind(subject.ingredient_id())
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AppError> {
        let rows = sqlx::query_as::<_, Alert>(
            r#"
            SELECT * FROM alerts
            WHERE ($1::alert_status IS NULL OR status = $1)
              AND ($2::alert_priority IS NULL OR priority = $2)
              AND ($3::alert_type IS NULL OR alert_type = $3)
            ORDER BY priority DESC, created_at DESC
            "#,
        )
            .bind(filter.status)
            .bind(filter.priority)
            .bind(filter.alert_type)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Alert>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: AlertStatus,
        resolved_by: Option<Uuid>,
    ) -> Result<Alert, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Arquivar um alerta resolvido preserva quem resolveu
        let row = sqlx::query_as::<_, Alert>(
            r#"
            UPDATE alerts SET
                status = $2,
                resolved_at = CASE WHEN $2 = 'RESOLVED'::alert_status THEN NOW() ELSE resolved_at END,
                resolved_by = COALESCE($3, resolved_by)
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(status)
            .bind(resolved_by)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }
}
