// src/services/alert_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AlertRepository, KitchenRepository, ProductRepository},
    models::alerts::{
        classify_stock, stock_alert_action, Alert, AlertFilter, AlertPriority, AlertStatus,
        AlertType, ScanReport, StockAlertAction, StockSubject,
    },
};

// Resultado da avaliação de um item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAlertOutcome {
    Created,
    AlreadyActive,
    Reclassified,
    Resolved(u64),
}

#[derive(Clone)]
pub struct AlertService {
    repo: AlertRepository,
    product_repo: ProductRepository,
    kitchen_repo: KitchenRepository,
    pool: PgPool,
}

fn stock_alert_text(alert_type: AlertType, name: &str, current: Decimal, minimum: Decimal) -> (String, String) {
    match alert_type {
        AlertType::OutOfStock => (
            format!("Sem estoque: {}", name),
            format!("'{}' está sem estoque (mínimo {}).", name, minimum.normalize()),
        ),
        _ => (
            format!("Estoque baixo: {}", name),
            format!(
                "'{}' está com {} (mínimo {}).",
                name,
                current.normalize(),
                minimum.normalize()
            ),
        ),
    }
}

impl AlertService {
    pub fn new(
        repo: AlertRepository,
        product_repo: ProductRepository,
        kitchen_repo: KitchenRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, product_repo, kitchen_repo, pool }
    }

    /// Reavalia o alerta de estoque de um item dentro da transação do chamador.
    pub async fn evaluate_stock_in(
        &self,
        conn: &mut PgConnection,
        subject: StockSubject,
        name: &str,
        current: Decimal,
        minimum: Decimal,
    ) -> Result<StockAlertOutcome, AppError> {
        let active = self.repo.find_active_stock_alert(&mut *conn, subject).await?;
        let action = stock_alert_action(
            active.as_ref().map(|a| (a.alert_type, a.priority)),
            classify_stock(current, minimum),
        );

        match (action, active) {
            (StockAlertAction::Create(alert_type, priority), _) => {
                let (title, message) = stock_alert_text(alert_type, name, current, minimum);
                self.repo
                    .create_alert(&mut *conn, alert_type, priority, &title, &message, Some(subject))
                    .await?;
                tracing::info!("🔔 Alerta de estoque criado: {}", title);
                Ok(StockAlertOutcome::Created)
            }
            (StockAlertAction::Reclassify(alert_type, priority), Some(alert)) => {
                let (title, message) = stock_alert_text(alert_type, name, current, minimum);
                self.repo
                    .reclassify(&mut *conn, alert.id, alert_type, priority, &title, &message)
                    .await?;
                tracing::info!("🔔 Alerta de estoque reclassificado: {}", title);
                Ok(StockAlertOutcome::Reclassified)
            }
            (StockAlertAction::Resolve, Some(_)) => {
                let resolved = self.repo.resolve_stock_alerts(&mut *conn, subject).await?;
                Ok(StockAlertOutcome::Resolved(resolved))
            }
            (StockAlertAction::Resolve, None) => Ok(StockAlertOutcome::Resolved(0)),
            // Reclassify só sai com alerta ativo
            (StockAlertAction::Keep, _) | (StockAlertAction::Reclassify(..), None) => {
                Ok(StockAlertOutcome::AlreadyActive)
            }
        }
    }

    pub async fn list(&self, filter: &AlertFilter) -> Result<Vec<Alert>, AppError> {
        self.repo.list_alerts(filter).await
    }

    pub async fn resolve(&self, alert_id: Uuid, user_id: Uuid) -> Result<Alert, AppError> {
        self.transition(alert_id, AlertStatus::Resolved, Some(user_id)).await
    }

    pub async fn archive(&self, alert_id: Uuid) -> Result<Alert, AppError> {
        self.transition(alert_id, AlertStatus::Archived, None).await
    }

    async fn transition(
        &self,
        alert_id: Uuid,
        next: AlertStatus,
        user_id: Option<Uuid>,
    ) -> Result<Alert, AppError> {
        let mut tx = self.pool.begin().await?;

        let alert = self
            .repo
            .find_for_update(&mut *tx, alert_id)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        if !alert.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: alert.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = self.repo.set_status(&mut *tx, alert_id, next, user_id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Varre todos os produtos e ingredientes ativos numa única transação.
    pub async fn scan(&self) -> Result<ScanReport, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut report = ScanReport::default();

        let products = self.product_repo.list_active(&mut *tx).await?;
        for p in products {
            let outcome = self
                .evaluate_stock_in(
                    &mut *tx,
                    StockSubject::Product(p.id),
                    &p.name,
                    p.current_stock,
                    p.minimum_stock,
                )
                .await?;
            report.record(outcome);
        }

        let ingredients = self.kitchen_repo.list_active_ingredients(&mut *tx).await?;
        for i in ingredients {
            let outcome = self
                .evaluate_stock_in(
                    &mut *tx,
                    StockSubject::Ingredient(i.id),
                    &i.name,
                    i.current_stock,
                    i.minimum_stock,
                )
                .await?;
            report.record(outcome);
        }

        tx.commit().await?;
        tracing::info!(
            "Varredura de alertas: {} criados, {} reclassificados, {} resolvidos",
            report.created,
            report.reclassified,
            report.resolved
        );
        Ok(report)
    }

    /// Alerta manual (tipo SYSTEM).
    pub async fn create_manual(
        &self,
        title: &str,
        message: &str,
        priority: AlertPriority,
    ) -> Result<Alert, AppError> {
        self.repo
            .create_alert(&self.pool, AlertType::System, priority, title, message, None)
            .await
    }
}

impl ScanReport {
    fn record(&mut self, outcome: StockAlertOutcome) {
        match outcome {
            StockAlertOutcome::Created => self.created += 1,
            StockAlertOutcome::Reclassified => self.reclassified += 1,
            StockAlertOutcome::Resolved(n) => self.resolved += n as usize,
            StockAlertOutcome::AlreadyActive => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn out_of_stock_text_mentions_the_item() {
        let (title, message) = stock_alert_text(AlertType::OutOfStock, "Limão", dec!(0), dec!(2));
        assert_eq!(title, "Sem estoque: Limão");
        assert!(message.contains("mínimo 2"));
    }

    #[test]
    fn low_stock_text_shows_levels() {
        let (title, message) = stock_alert_text(AlertType::LowStock, "Rum", dec!(1.500), dec!(3));
        assert_eq!(title, "Estoque baixo: Rum");
        assert_eq!(message, "'Rum' está com 1.5 (mínimo 3).");
    }

    #[test]
    fn scan_report_counts_outcomes() {
        let mut report = ScanReport::default();
        report.record(StockAlertOutcome::Created);
        report.record(StockAlertOutcome::AlreadyActive);
        report.record(StockAlertOutcome::Reclassified);
        report.record(StockAlertOutcome::Resolved(2));
        report.record(StockAlertOutcome::Resolved(0));
        assert_eq!(report.created, 1);
        assert_eq!(report.reclassified, 1);
        assert_eq!(report.resolved, 2);
    }

    async fn active_for(alerts: &AlertService, product_id: Uuid) -> Vec<Alert> {
        let filter = AlertFilter { status: Some(AlertStatus::Active), ..Default::default() };
        alerts
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .filter(|a| a.product_id == Some(product_id))
            .collect()
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn stock_alert_is_raised_once_escalated_and_resolved(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let rum = test_support::product(&state, "Rum", dec!(20), dec!(10)).await;
        let subject = StockSubject::Product(rum.id);
        let alerts = &state.alert_service;
        let mut conn = state.db_pool.acquire().await.unwrap();

        assert!(active_for(alerts, rum.id).await.is_empty());

        let outcome = alerts.evaluate_stock_in(&mut *conn, subject, "Rum", dec!(8), dec!(10)).await.unwrap();
        assert_eq!(outcome, StockAlertOutcome::Created);
        let outcome = alerts.evaluate_stock_in(&mut *conn, subject, "Rum", dec!(7), dec!(10)).await.unwrap();
        assert_eq!(outcome, StockAlertOutcome::AlreadyActive);
        assert_eq!(active_for(alerts, rum.id).await.len(), 1);

        // Zerou: o mesmo alerta sobe para OUT_OF_STOCK/CRITICAL
        let outcome = alerts.evaluate_stock_in(&mut *conn, subject, "Rum", dec!(0), dec!(10)).await.unwrap();
        assert_eq!(outcome, StockAlertOutcome::Reclassified);
        let current = active_for(alerts, rum.id).await;
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].alert_type, AlertType::OutOfStock);
        assert_eq!(current[0].priority, AlertPriority::Critical);
        assert_eq!(current[0].title, "Sem estoque: Rum");

        let outcome = alerts.evaluate_stock_in(&mut *conn, subject, "Rum", dec!(24), dec!(10)).await.unwrap();
        assert_eq!(outcome, StockAlertOutcome::Resolved(1));
        assert!(active_for(alerts, rum.id).await.is_empty());
    }
}
