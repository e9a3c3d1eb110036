// src/models/suppliers.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::validation::MONEY_SCALE;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[schema(example = "Distribuidora Central")]
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "supply_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyStatus {
    Pending,
    Received,
    Cancelled,
}

impl SupplyStatus {
    pub fn can_transition_to(self, next: SupplyStatus) -> bool {
        matches!(
            (self, next),
            (SupplyStatus::Pending, SupplyStatus::Received)
                | (SupplyStatus::Pending, SupplyStatus::Cancelled)
        )
    }
}

impl fmt::Display for SupplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SupplyStatus::Pending => "PENDING",
            SupplyStatus::Received => "RECEIVED",
            SupplyStatus::Cancelled => "CANCELLED",
        })
    }
}

// Pedido de compra (entrada de mercadoria)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub reference: Option<String>,
    pub status: SupplyStatus,
    pub total_amount: Decimal,
    #[schema(value_type = Option<String>, format = Date, example = "2026-10-20")]
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyItem {
    pub id: Uuid,
    pub supply_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyDetail {
    #[serde(flatten)]
    pub header: Supply,
    pub supplier_name: String,
    pub items: Vec<SupplyItem>,
}

#[derive(Debug, Default)]
pub struct SupplierChanges {
    pub name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Total de uma linha do pedido na escala de `supply_items.total_price`.
pub fn supply_line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    (quantity * unit_price).round_dp(MONEY_SCALE)
}

pub fn supply_total(lines: &[(Decimal, Decimal)]) -> Decimal {
    lines.iter().map(|(qty, price)| supply_line_total(*qty, *price)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn received_supply_is_final() {
        assert!(SupplyStatus::Pending.can_transition_to(SupplyStatus::Received));
        assert!(!SupplyStatus::Received.can_transition_to(SupplyStatus::Cancelled));
        assert!(!SupplyStatus::Cancelled.can_transition_to(SupplyStatus::Received));
    }

    #[test]
    fn supply_total_sums_lines() {
        let total = supply_total(&[(dec!(24), dec!(450)), (dec!(6), dec!(3000))]);
        assert_eq!(total, dec!(28800));
    }

    #[test]
    fn supply_total_matches_rounded_lines() {
        // custo com 4 casas: 3 x 0.3333 = 0.9999 -> 1.00
        assert_eq!(supply_line_total(dec!(3), dec!(0.3333)), dec!(1.00));
        let total = supply_total(&[(dec!(3), dec!(0.3333)), (dec!(1.5), dec!(2.0001))]);
        assert_eq!(total, dec!(1.00) + dec!(3.00));
    }
}
