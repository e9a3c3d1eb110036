// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "stock_movement_type", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum StockMovementType {
    Sale,       // "SALE"
    Purchase,   // "PURCHASE"
    Adjustment, // "ADJUSTMENT"
    Loss,       // "LOSS" (quebra, perda)
    Return,     // "RETURN" (estorno de venda cancelada)
}

// --- Livro-razão do estoque de produtos ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: StockMovementType,
    pub quantity: Decimal, // Positivo = entrada, negativo = saída
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit_price: Option<Decimal>,
    pub sale_id: Option<Uuid>,
    pub supply_id: Option<Uuid>,
    pub notes: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockValuation {
    pub products_value: Decimal,
    pub ingredients_value: Decimal,
    pub total_value: Decimal,
    pub low_stock_products: i64,
    pub low_stock_ingredients: i64,
}

/// Custo médio ponderado após uma entrada de `incoming_qty` unidades a `incoming_cost`.
pub fn weighted_average_cost(
    current_qty: Decimal,
    current_avg: Decimal,
    incoming_qty: Decimal,
    incoming_cost: Decimal,
) -> Decimal {
    // Estoque negativo herdado não deve puxar o custo para baixo
    let current_qty = current_qty.max(Decimal::ZERO);
    let total_current_value = current_qty * current_avg;
    let total_incoming_value = incoming_qty * incoming_cost;
    let new_total_qty = current_qty + incoming_qty;

    if new_total_qty <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((total_current_value + total_incoming_value) / new_total_qty).round_dp(4)
}

/// Novo saldo depois de um ajuste: `set_to` tem prioridade sobre `delta`.
pub fn resolve_adjustment(current: Decimal, set_to: Option<Decimal>, delta: Option<Decimal>) -> Option<Decimal> {
    match (set_to, delta) {
        (Some(target), _) => Some(target),
        (None, Some(d)) => Some(current + d),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn average_cost_blends_old_and_new_stock() {
        // 10 un a 100 + 10 un a 200 = 150
        assert_eq!(
            weighted_average_cost(dec!(10), dec!(100), dec!(10), dec!(200)),
            dec!(150)
        );
    }

    #[test]
    fn average_cost_of_empty_stock_is_incoming_cost() {
        assert_eq!(
            weighted_average_cost(dec!(0), dec!(999), dec!(4), dec!(12.5)),
            dec!(12.5)
        );
        assert_eq!(
            weighted_average_cost(dec!(-3), dec!(50), dec!(2), dec!(10)),
            dec!(10)
        );
    }

    #[test]
    fn average_cost_is_zero_without_quantity() {
        assert_eq!(
            weighted_average_cost(dec!(0), dec!(0), dec!(0), dec!(10)),
            Decimal::ZERO
        );
    }

    #[test]
    fn adjustment_prefers_absolute_value() {
        assert_eq!(resolve_adjustment(dec!(10), Some(dec!(3)), Some(dec!(5))), Some(dec!(3)));
        assert_eq!(resolve_adjustment(dec!(10), None, Some(dec!(-4))), Some(dec!(6)));
        assert_eq!(resolve_adjustment(dec!(10), None, None), None);
    }

    proptest! {
        #[test]
        fn average_cost_stays_between_the_two_costs(
            q0 in 1u32..10_000,
            c0 in 0u32..100_000,
            q in 1u32..10_000,
            c in 0u32..100_000,
        ) {
            let avg = weighted_average_cost(q0.into(), c0.into(), q.into(), c.into());
            let lo = Decimal::from(c0.min(c));
            let hi = Decimal::from(c0.max(c));
            prop_assert!(avg >= lo - dec!(0.0001) && avg <= hi + dec!(0.0001));
        }
    }
}
