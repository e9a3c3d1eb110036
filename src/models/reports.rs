// src/models/reports.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::sales::PaymentMethod;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[schema(value_type = String, format = Date, example = "2026-10-19")]
    pub date: NaiveDate,
    pub paid_sales: i64,
    pub pending_sales: i64,
    pub cancelled_sales: i64,
    pub revenue: Decimal,
    pub cost_of_goods: Decimal,
    pub expenses: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    pub average_ticket: Decimal,
}

// Números crus vindos do banco
#[derive(Debug, Default, Clone, FromRow)]
pub struct SummaryTotals {
    pub paid_sales: i64,
    pub pending_sales: i64,
    pub cancelled_sales: i64,
    pub revenue: Decimal,
    pub cost_of_goods: Decimal,
}

impl DailySummary {
    pub fn from_totals(date: NaiveDate, totals: SummaryTotals, expenses: Decimal) -> Self {
        let gross_profit = totals.revenue - totals.cost_of_goods;
        let average_ticket = if totals.paid_sales > 0 {
            (totals.revenue / Decimal::from(totals.paid_sales)).round_dp(2)
        } else {
            Decimal::ZERO
        };
        Self {
            date,
            paid_sales: totals.paid_sales,
            pending_sales: totals.pending_sales,
            cancelled_sales: totals.cancelled_sales,
            revenue: totals.revenue,
            cost_of_goods: totals.cost_of_goods,
            expenses,
            gross_profit,
            net_profit: gross_profit - expenses,
            average_ticket,
        }
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_sold: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodEntry {
    pub payment_method: PaymentMethod,
    pub sales_count: i64,
    pub total: Decimal,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Máximo de linhas (padrão 10)
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Dia do resumo (padrão: hoje)
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn profit_subtracts_costs_and_expenses() {
        let totals = SummaryTotals {
            paid_sales: 4,
            pending_sales: 1,
            cancelled_sales: 1,
            revenue: dec!(10000),
            cost_of_goods: dec!(4000),
        };
        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let summary = DailySummary::from_totals(day, totals, dec!(1500));
        assert_eq!(summary.gross_profit, dec!(6000));
        assert_eq!(summary.net_profit, dec!(4500));
        assert_eq!(summary.average_ticket, dec!(2500));
    }

    #[test]
    fn quiet_day_has_zero_ticket() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let summary = DailySummary::from_totals(day, SummaryTotals::default(), dec!(200));
        assert_eq!(summary.average_ticket, Decimal::ZERO);
        assert_eq!(summary.net_profit, dec!(-200));
    }
}
