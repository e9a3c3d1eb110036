// src/models/alerts.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    LowStock,
    OutOfStock,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "alert_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    Active,
    Resolved,
    Archived,
}

impl AlertStatus {
    pub fn can_transition_to(self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (AlertStatus::Active, AlertStatus::Resolved)
                | (AlertStatus::Active, AlertStatus::Archived)
                | (AlertStatus::Resolved, AlertStatus::Archived)
        )
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlertStatus::Active => "ACTIVE",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::Archived => "ARCHIVED",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub status: AlertStatus,
    #[schema(example = "Estoque baixo: Heineken 33cl")]
    pub title: String,
    pub message: String,
    pub product_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<Uuid>,
}

/// Item cujo estoque gera alertas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSubject {
    Product(Uuid),
    Ingredient(Uuid),
}

impl StockSubject {
    pub fn product_id(self) -> Option<Uuid> {
        match self {
            StockSubject::Product(id) => Some(id),
            StockSubject::Ingredient(_) => None,
        }
    }

    pub fn ingredient_id(self) -> Option<Uuid> {
        match self {
            StockSubject::Ingredient(id) => Some(id),
            StockSubject::Product(_) => None,
        }
    }
}

/// Classifica um nível de estoque. `None` quando está tudo bem.
pub fn classify_stock(current: Decimal, minimum: Decimal) -> Option<(AlertType, AlertPriority)> {
    if current <= Decimal::ZERO {
        return Some((AlertType::OutOfStock, AlertPriority::Critical));
    }
    if current <= minimum / Decimal::TWO {
        return Some((AlertType::LowStock, AlertPriority::High));
    }
    if current <= minimum {
        return Some((AlertType::LowStock, AlertPriority::Medium));
    }
    None
}

/// O que fazer com o alerta de estoque de um item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAlertAction {
    Create(AlertType, AlertPriority),
    Keep,
    /// O alerta ativo muda de tipo/prioridade (ex.: LOW_STOCK -> OUT_OF_STOCK) sem duplicar
    Reclassify(AlertType, AlertPriority),
    Resolve,
}

/// Decide a partir do alerta ativo (tipo, prioridade) e da classificação atual do estoque.
pub fn stock_alert_action(
    active: Option<(AlertType, AlertPriority)>,
    current: Option<(AlertType, AlertPriority)>,
) -> StockAlertAction {
    match (active, current) {
        (_, None) => StockAlertAction::Resolve,
        (None, Some((t, p))) => StockAlertAction::Create(t, p),
        (Some(existing), Some(now)) if existing == now => StockAlertAction::Keep,
        (Some(_), Some((t, p))) => StockAlertAction::Reclassify(t, p),
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub priority: Option<AlertPriority>,
    pub alert_type: Option<AlertType>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub created: usize,
    pub reclassified: usize,
    pub resolved: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_stock_is_critical() {
        assert_eq!(
            classify_stock(dec!(0), dec!(10)),
            Some((AlertType::OutOfStock, AlertPriority::Critical))
        );
        assert_eq!(
            classify_stock(dec!(-1), dec!(0)),
            Some((AlertType::OutOfStock, AlertPriority::Critical))
        );
    }

    #[test]
    fn half_of_minimum_is_high_priority() {
        assert_eq!(
            classify_stock(dec!(5), dec!(10)),
            Some((AlertType::LowStock, AlertPriority::High))
        );
        assert_eq!(
            classify_stock(dec!(10), dec!(10)),
            Some((AlertType::LowStock, AlertPriority::Medium))
        );
    }

    #[test]
    fn healthy_stock_raises_nothing() {
        assert_eq!(classify_stock(dec!(11), dec!(10)), None);
        assert_eq!(classify_stock(dec!(0.5), dec!(0)), None);
    }

    #[test]
    fn worsening_stock_reclassifies_the_active_alert() {
        let low = Some((AlertType::LowStock, AlertPriority::Medium));
        let out = classify_stock(dec!(0), dec!(10));
        assert_eq!(
            stock_alert_action(low, out),
            StockAlertAction::Reclassify(AlertType::OutOfStock, AlertPriority::Critical)
        );
        // e volta a baixar de grau depois de uma reposição parcial
        assert_eq!(
            stock_alert_action(out, classify_stock(dec!(4), dec!(10))),
            StockAlertAction::Reclassify(AlertType::LowStock, AlertPriority::High)
        );
    }

    #[test]
    fn same_level_keeps_and_healthy_resolves() {
        let low = Some((AlertType::LowStock, AlertPriority::Medium));
        assert_eq!(stock_alert_action(low, classify_stock(dec!(8), dec!(10))), StockAlertAction::Keep);
        assert_eq!(stock_alert_action(low, classify_stock(dec!(20), dec!(10))), StockAlertAction::Resolve);
        assert_eq!(
            stock_alert_action(None, low),
            StockAlertAction::Create(AlertType::LowStock, AlertPriority::Medium)
        );
    }

    #[test]
    fn archived_alerts_are_final() {
        assert!(AlertStatus::Active.can_transition_to(AlertStatus::Resolved));
        assert!(AlertStatus::Resolved.can_transition_to(AlertStatus::Archived));
        assert!(!AlertStatus::Archived.can_transition_to(AlertStatus::Active));
        assert!(!AlertStatus::Resolved.can_transition_to(AlertStatus::Resolved));
    }

    #[test]
    fn subject_exposes_one_id() {
        let id = Uuid::new_v4();
        assert_eq!(StockSubject::Product(id).product_id(), Some(id));
        assert_eq!(StockSubject::Product(id).ingredient_id(), None);
    }
}
