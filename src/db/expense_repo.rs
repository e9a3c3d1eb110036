// src/db/expense_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        expenses::{Expense, ExpenseCategory, ExpenseFilter},
        sales::PaymentMethod,
    },
};

pub struct NewExpense<'a> {
    pub category_id: Uuid,
    pub description: &'a str,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub payment_method: Option<PaymentMethod>,
    pub supplier_id: Option<Uuid>,
    pub receipt_number: Option<&'a str>,
    pub is_paid: bool,
    pub created_by: Uuid,
}

#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<ExpenseCategory, AppError> {
        sqlx::query_as::<_, ExpenseCategory>(
            "INSERT INTO expense_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
            .bind(name)
            .bind(description)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Expense category",
                            name: name.to_string(),
                        };
                    }
                }
                e.into()
            })
    }

    pub async fn list_categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        let rows = sqlx::query_as::<_, ExpenseCategory>("SELECT * FROM expense_categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_expense(&self, expense: NewExpense<'_>) -> Result<Expense, AppError> {
        sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (
                category_id, description, amount, expense_date, payment_method,
                supplier_id, receipt_number, is_paid, paid_at, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $8 THEN NOW() END, $9)
            RETURNING *
            "#,
        )
            .bind(expense.category_id)
            .bind(expense.description)
            .bind(expense.amount)
            .bind(expense.expense_date)
            .bind(expense.payment_method)
            .bind(expense.supplier_id)
            .bind(expense.receipt_number)
            .bind(expense.is_paid)
            .bind(expense.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        // categoria ou fornecedor inexistente
                        return match db_err.constraint() {
                            Some(c) if c.contains("supplier") => AppError::NotFound("Supplier"),
                            _ => AppError::NotFound("Expense category"),
                        };
                    }
                }
                e.into()
            })
    }

    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        let rows = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE ($1::date IS NULL OR expense_date >= $1)
              AND ($2::date IS NULL OR expense_date <= $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::bool IS NULL OR is_paid = $4)
            ORDER BY expense_date DESC, created_at DESC
            "#,
        )
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.category_id)
            .bind(filter.is_paid)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_expense(&self, id: Uuid) -> Result<Option<Expense>, AppError> {
        let row = sqlx::query_as::<_, Expense>("SELECT * FROM expenses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Só marca se ainda estiver em aberto. `None` quando já estava paga (ou não existe).
    pub async fn mark_paid(&self, id: Uuid, method: Option<PaymentMethod>) -> Result<Option<Expense>, AppError> {
        let row = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses SET
                is_paid = TRUE,
                paid_at = NOW(),
                payment_method = COALESCE($2, payment_method)
            WHERE id = $1 AND is_paid = FALSE
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(method)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete_expense(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
