// src/db/supplier_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::suppliers::{Supplier, SupplierChanges, Supply, SupplyItem, SupplyStatus},
};

#[derive(Clone)]
pub struct SupplierRepository {
    pool: PgPool,
}

impl SupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Fornecedores
    // ---

    pub async fn create_supplier(
        &self,
        name: &str,
        contact_person: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
        address: Option<&str>,
    ) -> Result<Supplier, AppError> {
        sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, contact_person, phone, email, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(contact_person)
            .bind(phone)
            .bind(email)
            .bind(address)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Supplier",
                            name: name.to_string(),
                        };
                    }
                }
                e.into()
            })
    }

    pub async fn list_suppliers(&self, only_active: bool) -> Result<Vec<Supplier>, AppError> {
        let rows = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY name ASC",
        )
            .bind(only_active)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_supplier(&self, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let row = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_supplier(&self, id: Uuid, changes: &SupplierChanges) -> Result<Option<Supplier>, AppError> {
        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE suppliers SET
                name = COALESCE($2, name),
                contact_person = COALESCE($3, contact_person),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                address = COALESCE($6, address),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.contact_person.as_deref())
            .bind(changes.phone.as_deref())
            .bind(changes.email.as_deref())
            .bind(changes.address.as_deref())
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Supplier",
                            name: changes.name.clone().unwrap_or_default(),
                        };
                    }
                }
                e.into()
            })
    }

    // ---
    // Pedidos de compra
    // ---

    pub async fn create_supply<'e, E>(
        &self,
        executor: E,
        supplier_id: Uuid,
        reference: Option<&str>,
        expected_date: Option<chrono::NaiveDate>,
        notes: Option<&str>,
        created_by: Uuid,
        total_amount: Decimal,
    ) -> Result<Supply, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Supply>(
            r#"
            INSERT INTO supplies (supplier_id, reference, expected_date, notes, created_by, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(supplier_id)
            .bind(reference)
            .bind(expected_date)
            .bind(notes)
            .bind(created_by)
            .bind(total_amount)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::NotFound("Supplier");
                    }
                }
                e.into()
            })
    }

    pub async fn add_supply_item<'e, E>(
        &self,
        executor: E,
        supply_id: Uuid,
        product_id: Uuid,
        product_name: &str,
        quantity: Decimal,
        unit_price: Decimal,
        total_price: Decimal,
    ) -> Result<SupplyItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SupplyItem>(
            r#"
            INSERT INTO supply_items (supply_id, product_id, product_name, quantity, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
            .bind(supply_id)
            .bind(product_id)
            .bind(product_name)
            .bind(quantity)
            .bind(unit_price)
            .bind(total_price)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn list_supplies(&self, status: Option<SupplyStatus>) -> Result<Vec<Supply>, AppError> {
        let rows = sqlx::query_as::<_, Supply>(
            r#"
            SELECT * FROM supplies
            WHERE ($1::supply_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_supply(&self, id: Uuid) -> Result<Option<Supply>, AppError> {
        let row = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_supply_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Supply>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Supply>("SELECT * FROM supplies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn supply_items<'e, E>(&self, executor: E, supply_id: Uuid) -> Result<Vec<SupplyItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, SupplyItem>(
            "SELECT * FROM supply_items WHERE supply_id = $1 ORDER BY product_name ASC",
        )
            .bind(supply_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn set_supply_status<'e, E>(&self, executor: E, id: Uuid, status: SupplyStatus) -> Result<Supply, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // received_at só é preenchido no recebimento
        let row = sqlx::query_as::<_, Supply>(
            r#"
            UPDATE supplies SET
                status = $2,
                received_at = CASE WHEN $2 = 'RECEIVED'::supply_status THEN NOW() ELSE received_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(status)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }
}
