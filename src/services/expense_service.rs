// src/services/expense_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{expense_repo::NewExpense, ExpenseRepository},
    models::{
        expenses::{Expense, ExpenseCategory, ExpenseFilter},
        sales::PaymentMethod,
    },
};

#[derive(Clone)]
pub struct ExpenseService {
    repo: ExpenseRepository,
}

impl ExpenseService {
    pub fn new(repo: ExpenseRepository) -> Self {
        Self { repo }
    }

    pub async fn create_category(&self, name: &str, description: Option<&str>) -> Result<ExpenseCategory, AppError> {
        self.repo.create_category(name.trim(), description).await
    }

    pub async fn list_categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn create_expense(&self, expense: NewExpense<'_>) -> Result<Expense, AppError> {
        let created = self.repo.create_expense(expense).await?;
        tracing::info!("Despesa lançada: {} ({})", created.description, created.amount);
        Ok(created)
    }

    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>, AppError> {
        self.repo.list_expenses(filter).await
    }

    /// Pagar duas vezes é conflito, não no-op.
    pub async fn mark_paid(&self, id: Uuid, method: Option<PaymentMethod>) -> Result<Expense, AppError> {
        if let Some(expense) = self.repo.mark_paid(id, method).await? {
            return Ok(expense);
        }
        match self.repo.find_expense(id).await? {
            Some(_) => Err(AppError::ExpenseAlreadyPaid),
            None => Err(AppError::NotFound("Expense")),
        }
    }

    pub async fn delete_expense(&self, id: Uuid) -> Result<(), AppError> {
        if !self.repo.delete_expense(id).await? {
            return Err(AppError::NotFound("Expense"));
        }
        Ok(())
    }
}
