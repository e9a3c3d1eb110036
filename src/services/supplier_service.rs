// src/services/supplier_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{ensure_scale, COST_SCALE, STOCK_SCALE},
    },
    db::{ProductRepository, SupplierRepository},
    models::{
        inventory::{weighted_average_cost, StockMovementType},
        suppliers::{supply_line_total, supply_total, Supplier, SupplierChanges, Supply, SupplyDetail, SupplyStatus},
    },
    services::inventory_service::{InventoryService, StockChange},
};

pub struct NewSupply<'a> {
    pub supplier_id: Uuid,
    pub reference: Option<&'a str>,
    pub expected_date: Option<NaiveDate>,
    pub notes: Option<&'a str>,
    /// (produto, quantidade, preço unitário)
    pub lines: Vec<(Uuid, Decimal, Decimal)>,
}

#[derive(Clone)]
pub struct SupplierService {
    repo: SupplierRepository,
    product_repo: ProductRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl SupplierService {
    pub fn new(
        repo: SupplierRepository,
        product_repo: ProductRepository,
        inventory_service: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self { repo, product_repo, inventory_service, pool }
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
        self.repo
            .create_supplier(name.trim(), contact_person, phone, email, address)
            .await
    }

    pub async fn list_suppliers(&self, only_active: bool) -> Result<Vec<Supplier>, AppError> {
        self.repo.list_suppliers(only_active).await
    }

    pub async fn update_supplier(&self, id: Uuid, changes: &SupplierChanges) -> Result<Supplier, AppError> {
        self.repo
            .update_supplier(id, changes)
            .await?
            .ok_or(AppError::NotFound("Supplier"))
    }

    // ---
    // Pedidos de compra
    // ---

    pub async fn create_supply(&self, new: NewSupply<'_>, created_by: Uuid) -> Result<SupplyDetail, AppError> {
        if new.lines.is_empty() {
            return Err(AppError::EmptyOrder);
        }
        for (_, quantity, unit_price) in &new.lines {
            ensure_scale("quantity", *quantity, STOCK_SCALE)?;
            ensure_scale("unitPrice", *unit_price, COST_SCALE)?;
        }

        let total = supply_total(
            &new.lines
                .iter()
                .map(|(_, quantity, price)| (*quantity, *price))
                .collect::<Vec<_>>(),
        );

        let mut tx = self.pool.begin().await?;

        let supply = self
            .repo
            .create_supply(
                &mut *tx,
                new.supplier_id,
                new.reference,
                new.expected_date,
                new.notes,
                created_by,
                total,
            )
            .await?;

        for (product_id, quantity, unit_price) in &new.lines {
            // O nome fica gravado na linha, como na venda
            let product = self
                .product_repo
                .find_for_update(&mut *tx, *product_id)
                .await?
                .ok_or(AppError::NotFound("Product"))?;
            self.repo
                .add_supply_item(
                    &mut *tx,
                    supply.id,
                    product.id,
                    &product.name,
                    *quantity,
                    *unit_price,
                    supply_line_total(*quantity, *unit_price),
                )
                .await?;
        }

        tx.commit().await?;
        tracing::info!("📦 Pedido de compra {} criado: total {}", supply.id, supply.total_amount);
        self.detail(supply).await
    }

    pub async fn list_supplies(&self, status: Option<SupplyStatus>) -> Result<Vec<Supply>, AppError> {
        self.repo.list_supplies(status).await
    }

    pub async fn get_supply(&self, id: Uuid) -> Result<SupplyDetail, AppError> {
        let supply = self.repo.find_supply(id).await?.ok_or(AppError::NotFound("Supply"))?;
        self.detail(supply).await
    }

    /// Recebimento: cada linha entra no estoque com custo médio ponderado.
    pub async fn receive(&self, id: Uuid, user_id: Uuid) -> Result<SupplyDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let supply = self
            .repo
            .find_supply_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Supply"))?;
        Self::check_transition(&supply, SupplyStatus::Received)?;

        let items = self.repo.supply_items(&mut *tx, id).await?;
        for item in &items {
            let product = self
                .product_repo
                .find_for_update(&mut *tx, item.product_id)
                .await?
                .ok_or(AppError::NotFound("Product"))?;

            let new_cost = weighted_average_cost(
                product.current_stock,
                product.purchase_price,
                item.quantity,
                item.unit_price,
            );

            self.inventory_service
                .apply_in(
                    &mut *tx,
                    &product,
                    StockChange {
                        movement_type: StockMovementType::Purchase,
                        quantity: item.quantity,
                        unit_price: Some(item.unit_price),
                        new_purchase_price: Some(new_cost),
                        sale_id: None,
                        supply_id: Some(id),
                        notes: supply.reference.as_deref(),
                        user_id: Some(user_id),
                    },
                )
                .await?;
        }

        let supply = self.repo.set_supply_status(&mut *tx, id, SupplyStatus::Received).await?;
        tx.commit().await?;

        tracing::info!("Pedido de compra {} recebido ({} itens)", id, items.len());
        self.detail(supply).await
    }

    pub async fn cancel(&self, id: Uuid) -> Result<SupplyDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let supply = self
            .repo
            .find_supply_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Supply"))?;
        Self::check_transition(&supply, SupplyStatus::Cancelled)?;

        let supply = self.repo.set_supply_status(&mut *tx, id, SupplyStatus::Cancelled).await?;
        tx.commit().await?;
        self.detail(supply).await
    }

    fn check_transition(supply: &Supply, next: SupplyStatus) -> Result<(), AppError> {
        if supply.status.can_transition_to(next) {
            return Ok(());
        }
        Err(AppError::InvalidTransition {
            from: supply.status.to_string(),
            to: next.to_string(),
        })
    }

    async fn detail(&self, header: Supply) -> Result<SupplyDetail, AppError> {
        let items = self.repo.supply_items(&self.pool, header.id).await?;
        let supplier_name = self
            .repo
            .find_supplier(header.supplier_id)
            .await?
            .map(|s| s.name)
            .unwrap_or_default();
        Ok(SupplyDetail { header, supplier_name, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn receiving_averages_the_cost_and_records_purchases(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        // 10 unidades a 2.00
        let gin = test_support::product(&state, "Gin", dec!(10), dec!(2)).await;
        let supplier = state
            .supplier_service
            .create_supplier("Distribuidora Central", None, None, None, None)
            .await
            .unwrap();

        let supply = state
            .supplier_service
            .create_supply(
                NewSupply {
                    supplier_id: supplier.id,
                    reference: Some("NF-1001"),
                    expected_date: None,
                    notes: None,
                    lines: vec![(gin.id, dec!(10), dec!(4))],
                },
                admin.id,
            )
            .await
            .unwrap();
        assert_eq!(supply.header.total_amount, dec!(40));

        let received = state.supplier_service.receive(supply.header.id, admin.id).await.unwrap();
        assert!(matches!(received.header.status, SupplyStatus::Received));

        let gin = state.product_service.get_product(gin.id).await.unwrap().product;
        assert_eq!(gin.current_stock, dec!(20));
        assert_eq!(gin.purchase_price, dec!(3));

        let purchases: Vec<_> = state
            .inventory_service
            .list_movements(Some(gin.id), None)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.movement_type == StockMovementType::Purchase)
            .collect();
        assert_eq!(purchases.len(), 1);
        assert_eq!(purchases[0].quantity, dec!(10));
        assert_eq!(purchases[0].stock_before, dec!(10));
        assert_eq!(purchases[0].stock_after, dec!(20));
        assert_eq!(purchases[0].unit_price, Some(dec!(4)));
        assert_eq!(purchases[0].supply_id, Some(supply.header.id));

        // Receber de novo não pode dar entrada em dobro
        let err = state.supplier_service.receive(supply.header.id, admin.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }
}
