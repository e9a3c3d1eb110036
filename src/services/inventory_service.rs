// src/services/inventory_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{ensure_scale, field_error, STOCK_SCALE},
    },
    db::{
        inventory_repo::NewStockMovement, InventoryRepository, ProductRepository,
    },
    models::{
        alerts::StockSubject,
        inventory::{resolve_adjustment, StockMovement, StockMovementType, StockValuation},
        products::{Product, ProductFilter},
    },
    services::alert_service::AlertService,
};

// Uma alteração de saldo a aplicar sobre um produto já travado
pub struct StockChange<'a> {
    pub movement_type: StockMovementType,
    pub quantity: Decimal, // com sinal
    pub unit_price: Option<Decimal>,
    pub new_purchase_price: Option<Decimal>,
    pub sale_id: Option<Uuid>,
    pub supply_id: Option<Uuid>,
    pub notes: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

pub struct StockAdjustment<'a> {
    pub product_id: Uuid,
    pub new_quantity: Option<Decimal>,
    pub delta: Option<Decimal>,
    pub movement_type: StockMovementType,
    pub notes: Option<&'a str>,
}

/// Ajuste manual só aceita ADJUSTMENT e LOSS; perda nunca aumenta o saldo.
pub fn check_manual_adjustment(
    movement_type: StockMovementType,
    current: Decimal,
    new_stock: Decimal,
) -> Result<(), AppError> {
    match movement_type {
        StockMovementType::Adjustment => Ok(()),
        StockMovementType::Loss if new_stock <= current => Ok(()),
        StockMovementType::Loss => Err(AppError::ValidationError(field_error(
            "delta",
            "loss_increases_stock",
            "Uma perda não pode aumentar o estoque.",
        ))),
        _ => Err(AppError::ValidationError(field_error(
            "movementType",
            "invalid_movement_type",
            "Ajustes manuais aceitam apenas ADJUSTMENT ou LOSS.",
        ))),
    }
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    product_repo: ProductRepository,
    alert_service: AlertService,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(
        repo: InventoryRepository,
        product_repo: ProductRepository,
        alert_service: AlertService,
        pool: PgPool,
    ) -> Self {
        Self { repo, product_repo, alert_service, pool }
    }

    /// Aplica a alteração no produto (já travado com FOR UPDATE), grava o livro-razão
    /// e reavalia os alertas. Nunca deixa o saldo negativo.
    pub async fn apply_in(
        &self,
        conn: &mut PgConnection,
        product: &Product,
        change: StockChange<'_>,
    ) -> Result<StockMovement, AppError> {
        // Com mais casas que a coluna, o banco arredondaria o saldo e o livro-razão não fecharia
        ensure_scale("quantity", change.quantity, STOCK_SCALE)?;

        let stock_before = product.current_stock;
        let stock_after = stock_before + change.quantity;
        if stock_after < Decimal::ZERO {
            return Err(AppError::NegativeStock(product.name.clone()));
        }

        match change.new_purchase_price {
            Some(cost) => {
                self.product_repo
                    .set_stock_and_cost(&mut *conn, product.id, stock_after, cost)
                    .await?
            }
            None => self.product_repo.set_stock(&mut *conn, product.id, stock_after).await?,
        }

        let movement = self
            .repo
            .record_stock_movement(
                &mut *conn,
                NewStockMovement {
                    product_id: product.id,
                    movement_type: change.movement_type,
                    quantity: change.quantity,
                    stock_before,
                    stock_after,
                    unit_price: change.unit_price,
                    sale_id: change.sale_id,
                    supply_id: change.supply_id,
                    notes: change.notes,
                    user_id: change.user_id,
                },
            )
            .await?;

        self.alert_service
            .evaluate_stock_in(
                conn,
                StockSubject::Product(product.id),
                &product.name,
                stock_after,
                product.minimum_stock,
            )
            .await?;

        Ok(movement)
    }

    pub async fn adjust_stock(
        &self,
        adjustment: StockAdjustment<'_>,
        user_id: Uuid,
    ) -> Result<StockMovement, AppError> {
        let mut tx = self.pool.begin().await?;

        let product = self
            .product_repo
            .find_for_update(&mut *tx, adjustment.product_id)
            .await?
            .ok_or(AppError::NotFound("Product"))?;

        let new_stock = resolve_adjustment(product.current_stock, adjustment.new_quantity, adjustment.delta)
            .ok_or_else(|| {
                AppError::ValidationError(field_error(
                    "newQuantity",
                    "required",
                    "Informe a nova quantidade ou a variação.",
                ))
            })?;
        check_manual_adjustment(adjustment.movement_type, product.current_stock, new_stock)?;

        let movement = self
            .apply_in(
                &mut *tx,
                &product,
                StockChange {
                    movement_type: adjustment.movement_type,
                    quantity: new_stock - product.current_stock,
                    unit_price: Some(product.purchase_price),
                    new_purchase_price: None,
                    sale_id: None,
                    supply_id: None,
                    notes: adjustment.notes,
                    user_id: Some(user_id),
                },
            )
            .await?;

        tx.commit().await?;
        tracing::info!(
            "Estoque de '{}' ajustado: {} -> {}",
            product.name,
            movement.stock_before,
            movement.stock_after
        );
        Ok(movement)
    }

    pub async fn list_movements(&self, product_id: Option<Uuid>, limit: Option<i64>) -> Result<Vec<StockMovement>, AppError> {
        let limit = limit.unwrap_or(100).clamp(1, 500);
        self.repo.list_movements(product_id, limit).await
    }

    pub async fn low_stock(&self) -> Result<Vec<Product>, AppError> {
        let filter = ProductFilter {
            is_active: Some(true),
            low_stock: Some(true),
            ..Default::default()
        };
        self.product_repo.list_products(&filter).await
    }

    pub async fn valuation(&self) -> Result<StockValuation, AppError> {
        self.repo.valuation().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn adjustments_may_go_either_way() {
        assert!(check_manual_adjustment(StockMovementType::Adjustment, dec!(5), dec!(12)).is_ok());
        assert!(check_manual_adjustment(StockMovementType::Adjustment, dec!(5), dec!(0)).is_ok());
    }

    #[test]
    fn loss_only_removes_stock() {
        assert!(check_manual_adjustment(StockMovementType::Loss, dec!(5), dec!(3)).is_ok());
        assert!(matches!(
            check_manual_adjustment(StockMovementType::Loss, dec!(5), dec!(6)),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn system_movement_types_are_refused() {
        for t in [StockMovementType::Sale, StockMovementType::Purchase, StockMovementType::Return] {
            assert!(check_manual_adjustment(t, dec!(5), dec!(4)).is_err());
        }
    }
}
