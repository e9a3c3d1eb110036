// src/services/report_service.rs

use chrono::{NaiveDate, Utc};

use crate::{
    common::{error::AppError, validation::field_error},
    db::ReportRepository,
    models::reports::{DailySummary, PaymentMethodEntry, ReportRange, TopProductEntry},
};

const DEFAULT_TOP_LIMIT: i64 = 10;
const MAX_TOP_LIMIT: i64 = 100;

/// Intervalo invertido é erro do cliente.
pub fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::ValidationError(field_error(
                "from",
                "range",
                "A data inicial deve ser anterior à final.",
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    pub async fn daily_summary(&self, date: Option<NaiveDate>) -> Result<DailySummary, AppError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let totals = self.repo.day_totals(date).await?;
        let expenses = self.repo.day_expenses(date).await?;
        Ok(DailySummary::from_totals(date, totals, expenses))
    }

    pub async fn top_products(&self, range: &ReportRange) -> Result<Vec<TopProductEntry>, AppError> {
        check_range(range.from, range.to)?;
        let limit = range.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
        self.repo.top_products(range.from, range.to, limit).await
    }

    pub async fn sales_by_payment_method(&self, range: &ReportRange) -> Result<Vec<PaymentMethodEntry>, AppError> {
        check_range(range.from, range.to)?;
        self.repo.sales_by_payment_method(range.from, range.to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_range_is_rejected() {
        let a = NaiveDate::from_ymd_opt(2026, 10, 1);
        let b = NaiveDate::from_ymd_opt(2026, 10, 31);
        assert!(check_range(a, b).is_ok());
        assert!(check_range(b, a).is_err());
        assert!(check_range(None, a).is_ok());
    }
}
