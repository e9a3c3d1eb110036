// src/services/sales_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{ensure_scale, MONEY_SCALE, STOCK_SCALE},
    },
    db::{InventoryRepository, KitchenRepository, ProductRepository, SalesRepository},
    models::{
        inventory::StockMovementType,
        sales::{compute_sale_total, PaymentMethod, PricedLine, Sale, SaleDetail, SaleFilter, SaleStatus},
    },
    services::{
        inventory_service::{InventoryService, StockChange},
        kitchen_service::KitchenService,
    },
};

pub struct SaleLineInput {
    pub product_id: Uuid,
    pub quantity: Decimal,
    /// Sem preço informado, vale o preço de venda do produto
    pub unit_price: Option<Decimal>,
}

pub struct NewSale<'a> {
    pub table_number: Option<i32>,
    pub customer_name: Option<&'a str>,
    pub discount: Decimal,
    pub notes: Option<&'a str>,
    pub lines: Vec<SaleLineInput>,
}

// Quantidades e preços precisam caber nas colunas sem arredondamento
fn check_sale_scales(new: &NewSale<'_>) -> Result<(), AppError> {
    ensure_scale("discount", new.discount, MONEY_SCALE)?;
    for line in &new.lines {
        ensure_scale("quantity", line.quantity, STOCK_SCALE)?;
        if let Some(price) = line.unit_price {
            ensure_scale("unitPrice", price, MONEY_SCALE)?;
        }
    }
    Ok(())
}

fn check_transition(sale: &Sale, next: SaleStatus) -> Result<(), AppError> {
    if sale.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: sale.status.to_string(),
            to: next.to_string(),
        })
    }
}

#[derive(Clone)]
pub struct SalesService {
    repo: SalesRepository,
    product_repo: ProductRepository,
    inventory_repo: InventoryRepository,
    kitchen_repo: KitchenRepository,
    inventory_service: InventoryService,
    kitchen_service: KitchenService,
    pool: PgPool,
}

impl SalesService {
    pub fn new(
        repo: SalesRepository,
        product_repo: ProductRepository,
        inventory_repo: InventoryRepository,
        kitchen_repo: KitchenRepository,
        inventory_service: InventoryService,
        kitchen_service: KitchenService,
        pool: PgPool,
    ) -> Self {
        Self {
            repo,
            product_repo,
            inventory_repo,
            kitchen_repo,
            inventory_service,
            kitchen_service,
            pool,
        }
    }

    pub async fn create_sale(&self, new: NewSale<'_>, server_id: Uuid) -> Result<SaleDetail, AppError> {
        if new.lines.is_empty() {
            return Err(AppError::EmptyOrder);
        }
        check_sale_scales(&new)?;

        // --- INÍCIO DA TRANSAÇÃO ---
        let mut tx = self.pool.begin().await?;

        let sale = self
            .repo
            .create_sale(
                &mut *tx,
                new.table_number,
                new.customer_name,
                server_id,
                new.discount,
                new.notes,
            )
            .await?;

        let mut priced = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            // 1. Trava o produto até o fim da venda
            let product = self
                .product_repo
                .find_for_update(&mut *tx, line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or(AppError::NotFound("Product"))?;

            let unit_price = line.unit_price.unwrap_or(product.selling_price);

            // 2. Produto com receita baixa ingredientes; os demais baixam o próprio estoque
            let recipe = self
                .kitchen_repo
                .find_active_recipe_by_product(&mut *tx, product.id)
                .await?;
            match recipe {
                Some(recipe) => {
                    self.kitchen_service
                        .consume_in(&mut *tx, &recipe, line.quantity, Some(sale.id), Some(server_id))
                        .await?;
                }
                None => {
                    if product.current_stock < line.quantity {
                        return Err(AppError::InsufficientStock {
                            product: product.name,
                            available: product.current_stock,
                            requested: line.quantity,
                        });
                    }
                    self.inventory_service
                        .apply_in(
                            &mut *tx,
                            &product,
                            StockChange {
                                movement_type: StockMovementType::Sale,
                                quantity: -line.quantity,
                                unit_price: Some(unit_price),
                                new_purchase_price: None,
                                sale_id: Some(sale.id),
                                supply_id: None,
                                notes: None,
                                user_id: Some(server_id),
                            },
                        )
                        .await?;
                }
            }

            // 3. Linha com o custo do momento
            let priced_line = PricedLine { quantity: line.quantity, unit_price };
            self.repo
                .add_item(
                    &mut *tx,
                    sale.id,
                    product.id,
                    &product.name,
                    line.quantity,
                    unit_price,
                    product.purchase_price,
                    priced_line.total(),
                )
                .await?;

            priced.push(priced_line);
        }

        let total = compute_sale_total(&priced, new.discount);
        let sale = self.repo.set_total(&mut *tx, sale.id, total).await?;

        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        tracing::info!("🧾 Venda #{} registrada: total {}", sale.display_id, sale.total_amount);
        self.detail(sale).await
    }

    pub async fn mark_paid(&self, sale_id: Uuid, method: PaymentMethod) -> Result<SaleDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .repo
            .find_for_update(&mut *tx, sale_id)
            .await?
            .ok_or(AppError::NotFound("Sale"))?;
        check_transition(&sale, SaleStatus::Paid)?;

        let sale = self.repo.mark_paid(&mut *tx, sale_id, method).await?;
        tx.commit().await?;

        self.detail(sale).await
    }

    /// Cancela e devolve ao estoque tudo o que a venda baixou (produtos e ingredientes).
    pub async fn cancel(&self, sale_id: Uuid, reason: Option<&str>, user_id: Uuid) -> Result<SaleDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .repo
            .find_for_update(&mut *tx, sale_id)
            .await?
            .ok_or(AppError::NotFound("Sale"))?;
        check_transition(&sale, SaleStatus::Cancelled)?;

        let outflows = self.inventory_repo.sale_outflows(&mut *tx, sale_id).await?;
        for outflow in &outflows {
            let Some(product) = self
                .product_repo
                .find_for_update(&mut *tx, outflow.product_id)
                .await?
            else {
                continue;
            };
            self.inventory_service
                .apply_in(
                    &mut *tx,
                    &product,
                    StockChange {
                        movement_type: StockMovementType::Return,
                        quantity: -outflow.quantity,
                        unit_price: outflow.unit_price,
                        new_purchase_price: None,
                        sale_id: Some(sale_id),
                        supply_id: None,
                        notes: Some("Estorno de venda cancelada"),
                        user_id: Some(user_id),
                    },
                )
                .await?;
        }

        let returned_ingredients = self
            .kitchen_service
            .return_sale_consumptions_in(&mut *tx, sale_id, user_id)
            .await?;

        let sale = self.repo.mark_cancelled(&mut *tx, sale_id, reason).await?;
        tx.commit().await?;

        tracing::info!(
            "Venda #{} cancelada ({} produtos e {} ingredientes devolvidos)",
            sale.display_id,
            outflows.len(),
            returned_ingredients
        );
        self.detail(sale).await
    }

    pub async fn list_sales(&self, filter: &SaleFilter) -> Result<Vec<Sale>, AppError> {
        self.repo.list_sales(filter).await
    }

    pub async fn get_sale(&self, sale_id: Uuid) -> Result<SaleDetail, AppError> {
        let sale = self.repo.find_by_id(sale_id).await?.ok_or(AppError::NotFound("Sale"))?;
        self.detail(sale).await
    }

    async fn detail(&self, header: Sale) -> Result<SaleDetail, AppError> {
        let items = self.repo.list_items(header.id).await?;
        let server_username = match header.server_id {
            Some(id) => self.repo.server_username(id).await?,
            None => None,
        };
        Ok(SaleDetail { header, server_username, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sale(status: SaleStatus) -> Sale {
        Sale {
            id: Uuid::new_v4(),
            display_id: 7,
            table_number: Some(3),
            customer_name: None,
            server_id: None,
            status,
            payment_method: None,
            discount_amount: dec!(0),
            total_amount: dec!(1500),
            notes: None,
            created_at: Utc::now(),
            paid_at: None,
            cancelled_at: None,
            cancel_reason: None,
        }
    }

    #[test]
    fn paid_sale_cannot_be_cancelled() {
        let err = check_transition(&sale(SaleStatus::Paid), SaleStatus::Cancelled).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to } => {
                assert_eq!(from, "PAID");
                assert_eq!(to, "CANCELLED");
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn pending_sale_accepts_both_outcomes() {
        assert!(check_transition(&sale(SaleStatus::Pending), SaleStatus::Paid).is_ok());
        assert!(check_transition(&sale(SaleStatus::Pending), SaleStatus::Cancelled).is_ok());
    }

    fn line(product_id: Uuid, quantity: Decimal, unit_price: Option<Decimal>) -> SaleLineInput {
        SaleLineInput { product_id, quantity, unit_price }
    }

    fn order(lines: Vec<SaleLineInput>) -> NewSale<'static> {
        NewSale { table_number: Some(4), customer_name: None, discount: dec!(0), notes: None, lines }
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn cancel_returns_products_and_ingredients(pool: PgPool) {
        use crate::models::kitchen::IngredientMovementType;
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let beer = test_support::product(&state, "Cerveja", dec!(10), dec!(2)).await;
        let lime = test_support::ingredient(&state, "Limão", dec!(2), dec!(0.5)).await;
        let (dish, _) = test_support::dish(&state, lime.id, dec!(0.25)).await;

        let sale = state
            .sales_service
            .create_sale(
                order(vec![line(beer.id, dec!(3), None), line(dish.id, dec!(2), None)]),
                admin.id,
            )
            .await
            .unwrap();
        let beer_after_sale = state.product_service.get_product(beer.id).await.unwrap().product;
        assert_eq!(beer_after_sale.current_stock, dec!(7));
        assert_eq!(state.kitchen_service.get_ingredient(lime.id).await.unwrap().current_stock, dec!(1.5));

        let cancelled = state
            .sales_service
            .cancel(sale.header.id, Some("Cliente desistiu"), admin.id)
            .await
            .unwrap();
        assert_eq!(cancelled.header.status, SaleStatus::Cancelled);

        let beer_back = state.product_service.get_product(beer.id).await.unwrap().product;
        assert_eq!(beer_back.current_stock, dec!(10));
        let lime_back = state.kitchen_service.get_ingredient(lime.id).await.unwrap();
        assert_eq!(lime_back.current_stock, dec!(2));

        let product_returns: Vec<_> = state
            .inventory_service
            .list_movements(Some(beer.id), None)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.movement_type == StockMovementType::Return)
            .collect();
        assert_eq!(product_returns.len(), 1);
        assert_eq!(product_returns[0].quantity, dec!(3));
        assert_eq!(product_returns[0].sale_id, Some(sale.header.id));
        assert_eq!(
            product_returns[0].stock_before + product_returns[0].quantity,
            product_returns[0].stock_after
        );

        let ingredient_returns: Vec<_> = state
            .kitchen_service
            .ingredient_movements(lime.id, None)
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.movement_type == IngredientMovementType::Return)
            .collect();
        assert_eq!(ingredient_returns.len(), 1);
        assert_eq!(ingredient_returns[0].quantity, dec!(0.5));
        assert_eq!(ingredient_returns[0].stock_after, dec!(2));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn stored_lines_add_up_to_the_sale_total(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let lemonade = test_support::product(&state, "Limonada", dec!(50), dec!(0)).await;

        let sale = state
            .sales_service
            .create_sale(
                order(vec![
                    line(lemonade.id, dec!(3), Some(dec!(0.33))),
                    line(lemonade.id, dec!(0.5), Some(dec!(3.33))),
                ]),
                admin.id,
            )
            .await
            .unwrap();

        let lines: Decimal = sale.items.iter().map(|i| i.total_price).sum();
        assert_eq!(sale.items[0].total_price + sale.items[1].total_price, dec!(2.65));
        assert_eq!(sale.header.total_amount, lines);
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn sub_precision_quantities_leave_stock_untouched(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let shot = test_support::product(&state, "Dose", dec!(0.001), dec!(0)).await;

        let err = state
            .sales_service
            .create_sale(order(vec![line(shot.id, dec!(0.0005), None)]), admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = state
            .sales_service
            .create_sale(order(vec![line(shot.id, dec!(3), Some(dec!(0.335)))]), admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let shot = state.product_service.get_product(shot.id).await.unwrap().product;
        assert_eq!(shot.current_stock, dec!(0.001));
        assert!(state.inventory_service.list_movements(Some(shot.id), None).await.unwrap().is_empty());
    }
}
