// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::validation::MONEY_SCALE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sale_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Pending,
    Paid,
    Cancelled,
}

impl SaleStatus {
    /// Só vendas em aberto mudam de status; pagas e canceladas são finais.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Paid) | (SaleStatus::Pending, SaleStatus::Cancelled)
        )
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Paid => "PAID",
            SaleStatus::Cancelled => "CANCELLED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    Credit, // Fiado / conta do cliente
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(example = 1024)]
    pub display_id: i32,
    #[schema(example = 7)]
    pub table_number: Option<i32>,
    pub customer_name: Option<String>,
    pub server_id: Option<Uuid>,
    pub status: SaleStatus,
    pub payment_method: Option<PaymentMethod>,
    #[schema(example = "0.00")]
    pub discount_amount: Decimal,
    #[schema(example = "4500.00")]
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub unit_cost: Decimal, // Custo no momento da venda
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub header: Sale,
    pub server_username: Option<String>,
    pub items: Vec<SaleItem>,
}

// Linha já resolvida (preço definido) antes de gravar
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl PricedLine {
    /// Total da linha já na escala de `sale_items.total_price`.
    pub fn total(&self) -> Decimal {
        (self.quantity * self.unit_price).round_dp(MONEY_SCALE)
    }
}

/// Total da venda: soma das linhas (já arredondadas) menos o desconto, nunca abaixo de zero.
pub fn compute_sale_total(lines: &[PricedLine], discount: Decimal) -> Decimal {
    let gross: Decimal = lines.iter().map(PricedLine::total).sum();
    (gross - discount).max(Decimal::ZERO)
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    /// Data inicial (inclusive), YYYY-MM-DD
    pub from: Option<NaiveDate>,
    /// Data final (inclusive), YYYY-MM-DD
    pub to: Option<NaiveDate>,
    pub server_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_pending_sales_can_change_status() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Paid));
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Paid.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Cancelled.can_transition_to(SaleStatus::Paid));
        assert!(!SaleStatus::Pending.can_transition_to(SaleStatus::Pending));
    }

    #[test]
    fn total_subtracts_discount() {
        let lines = vec![
            PricedLine { quantity: dec!(2), unit_price: dec!(800) },
            PricedLine { quantity: dec!(1), unit_price: dec!(2500) },
        ];
        assert_eq!(compute_sale_total(&lines, dec!(100)), dec!(4000));
    }

    #[test]
    fn discount_never_makes_total_negative() {
        let lines = vec![PricedLine { quantity: dec!(1), unit_price: dec!(500) }];
        assert_eq!(compute_sale_total(&lines, dec!(900)), Decimal::ZERO);
        assert_eq!(compute_sale_total(&[], Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn total_equals_sum_of_stored_line_totals() {
        // 0.5 x 3.33 = 1.665 -> linha gravada 1.66 (banker's rounding)
        let lines = vec![
            PricedLine { quantity: dec!(0.5), unit_price: dec!(3.33) },
            PricedLine { quantity: dec!(0.125), unit_price: dec!(0.99) },
        ];
        assert_eq!(lines[0].total(), dec!(1.66));
        assert_eq!(lines[1].total(), dec!(0.12));
        let stored: Decimal = lines.iter().map(PricedLine::total).sum();
        assert_eq!(compute_sale_total(&lines, dec!(0.5)), stored - dec!(0.5));
        assert_eq!(compute_sale_total(&lines, Decimal::ZERO).scale(), 2);
    }

    #[test]
    fn payment_method_json_matches_database_labels() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::MobileMoney).unwrap(),
            "\"MOBILE_MONEY\""
        );
    }
}
