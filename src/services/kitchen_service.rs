// src/services/kitchen_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{ensure_scale, field_error, COST_SCALE, INGREDIENT_SCALE},
    },
    db::{
        kitchen_repo::{IngredientChanges, NewIngredientMovement},
        KitchenRepository, ProductRepository,
    },
    models::{
        alerts::StockSubject,
        inventory::weighted_average_cost,
        kitchen::{
            cost_breakdown, plan_consumption, Ingredient, IngredientMovement,
            IngredientMovementType, Recipe, RecipeCost, RecipeDetail, RestockOutcome,
        },
    },
    services::alert_service::AlertService,
};

pub struct NewRecipe<'a> {
    pub product_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub preparation_time: Option<i32>,
    pub lines: Vec<(Uuid, Decimal)>,
}

/// Linhas de receita: ao menos uma, sem ingrediente repetido, quantidades positivas.
pub fn check_recipe_lines(lines: &[(Uuid, Decimal)]) -> Result<(), AppError> {
    if lines.is_empty() {
        return Err(AppError::ValidationError(field_error(
            "lines",
            "required",
            "A receita precisa de ao menos um ingrediente.",
        )));
    }
    let mut seen = HashSet::new();
    for (ingredient_id, quantity) in lines {
        if !seen.insert(*ingredient_id) {
            return Err(AppError::ValidationError(field_error(
                "lines",
                "duplicate_ingredient",
                "O mesmo ingrediente aparece mais de uma vez.",
            )));
        }
        if *quantity <= Decimal::ZERO {
            return Err(AppError::ValidationError(field_error(
                "lines",
                "range",
                "A quantidade por porção deve ser maior que zero.",
            )));
        }
        ensure_scale("lines", *quantity, INGREDIENT_SCALE)?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct KitchenService {
    repo: KitchenRepository,
    product_repo: ProductRepository,
    alert_service: AlertService,
    pool: PgPool,
}

impl KitchenService {
    pub fn new(
        repo: KitchenRepository,
        product_repo: ProductRepository,
        alert_service: AlertService,
        pool: PgPool,
    ) -> Self {
        Self { repo, product_repo, alert_service, pool }
    }

    // =========================================================================
    //  INGREDIENTES
    // =========================================================================

    pub async fn create_ingredient(
        &self,
        name: &str,
        unit: &str,
        initial_stock: Decimal,
        minimum_stock: Decimal,
        unit_price: Decimal,
    ) -> Result<Ingredient, AppError> {
        let mut tx = self.pool.begin().await?;
        let ingredient = self
            .repo
            .create_ingredient(&mut *tx, name.trim(), unit, initial_stock, minimum_stock, unit_price)
            .await?;
        self.evaluate_ingredient_in(&mut *tx, &ingredient, ingredient.current_stock).await?;
        tx.commit().await?;
        Ok(ingredient)
    }

    pub async fn list_ingredients(&self, only_active: bool) -> Result<Vec<Ingredient>, AppError> {
        self.repo.list_ingredients(only_active).await
    }

    pub async fn get_ingredient(&self, id: Uuid) -> Result<Ingredient, AppError> {
        self.repo.find_ingredient(id).await?.ok_or(AppError::NotFound("Ingredient"))
    }

    pub async fn update_ingredient(&self, id: Uuid, changes: &IngredientChanges) -> Result<Ingredient, AppError> {
        let ingredient = self
            .repo
            .update_ingredient(id, changes)
            .await?
            .ok_or(AppError::NotFound("Ingredient"))?;

        if changes.minimum_stock.is_some() {
            let mut conn = self.pool.acquire().await?;
            self.evaluate_ingredient_in(&mut *conn, &ingredient, ingredient.current_stock).await?;
        }
        Ok(ingredient)
    }

    /// Entrada de mercadoria: custo médio ponderado e recálculo das receitas que usam o ingrediente.
    pub async fn restock(
        &self,
        ingredient_id: Uuid,
        quantity: Decimal,
        unit_price: Decimal,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<RestockOutcome, AppError> {
        ensure_scale("quantity", quantity, INGREDIENT_SCALE)?;
        ensure_scale("unitPrice", unit_price, COST_SCALE)?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_ingredient_for_update(&mut *tx, ingredient_id)
            .await?
            .ok_or(AppError::NotFound("Ingredient"))?;

        let new_price = weighted_average_cost(current.current_stock, current.unit_price, quantity, unit_price);
        let stock_after = current.current_stock + quantity;

        let ingredient = self
            .repo
            .set_ingredient_stock_and_price(&mut *tx, ingredient_id, stock_after, new_price)
            .await?;

        let movement = self
            .repo
            .record_ingredient_movement(
                &mut *tx,
                NewIngredientMovement {
                    ingredient_id,
                    movement_type: IngredientMovementType::Restock,
                    quantity,
                    stock_before: current.current_stock,
                    stock_after,
                    unit_price: Some(unit_price),
                    recipe_id: None,
                    sale_id: None,
                    reason,
                    user_id: Some(user_id),
                },
            )
            .await?;

        self.evaluate_ingredient_in(&mut *tx, &ingredient, stock_after).await?;

        // O custo das receitas depende do custo médio do ingrediente
        let mut recalculated = Vec::new();
        for recipe in self.repo.recipes_using_ingredient(&mut *tx, ingredient_id).await? {
            recalculated.push(self.recalculate_in(&mut *tx, &recipe).await?);
        }

        tx.commit().await?;
        tracing::info!(
            "Reposição de '{}': +{} (custo médio {} -> {}), {} receitas recalculadas",
            ingredient.name,
            quantity,
            current.unit_price,
            new_price,
            recalculated.len()
        );

        Ok(RestockOutcome { ingredient, movement, recalculated })
    }

    pub async fn adjust_ingredient(
        &self,
        ingredient_id: Uuid,
        delta: Decimal,
        movement_type: IngredientMovementType,
        reason: Option<&str>,
        user_id: Uuid,
    ) -> Result<IngredientMovement, AppError> {
        match movement_type {
            IngredientMovementType::Adjustment => {}
            IngredientMovementType::Loss if delta <= Decimal::ZERO => {}
            IngredientMovementType::Loss => {
                return Err(AppError::ValidationError(field_error(
                    "delta",
                    "loss_increases_stock",
                    "Uma perda não pode aumentar o estoque.",
                )));
            }
            _ => {
                return Err(AppError::ValidationError(field_error(
                    "movementType",
                    "invalid_movement_type",
                    "Ajustes manuais aceitam apenas ADJUSTMENT ou LOSS.",
                )));
            }
        }
        ensure_scale("delta", delta, INGREDIENT_SCALE)?;

        let mut tx = self.pool.begin().await?;

        let ingredient = self
            .repo
            .find_ingredient_for_update(&mut *tx, ingredient_id)
            .await?
            .ok_or(AppError::NotFound("Ingredient"))?;

        let stock_after = ingredient.current_stock + delta;
        if stock_after < Decimal::ZERO {
            return Err(AppError::NegativeStock(ingredient.name));
        }

        self.repo.set_ingredient_stock(&mut *tx, ingredient_id, stock_after).await?;
        let movement = self
            .repo
            .record_ingredient_movement(
                &mut *tx,
                NewIngredientMovement {
                    ingredient_id,
                    movement_type,
                    quantity: delta,
                    stock_before: ingredient.current_stock,
                    stock_after,
                    unit_price: Some(ingredient.unit_price),
                    recipe_id: None,
                    sale_id: None,
                    reason,
                    user_id: Some(user_id),
                },
            )
            .await?;

        self.evaluate_ingredient_in(&mut *tx, &ingredient, stock_after).await?;
        tx.commit().await?;
        Ok(movement)
    }

    pub async fn ingredient_movements(&self, ingredient_id: Uuid, limit: Option<i64>) -> Result<Vec<IngredientMovement>, AppError> {
        self.get_ingredient(ingredient_id).await?;
        let limit = limit.unwrap_or(100).clamp(1, 500);
        self.repo.list_ingredient_movements(ingredient_id, limit).await
    }

    async fn evaluate_ingredient_in(
        &self,
        conn: &mut PgConnection,
        ingredient: &Ingredient,
        current_stock: Decimal,
    ) -> Result<(), AppError> {
        self.alert_service
            .evaluate_stock_in(
                conn,
                StockSubject::Ingredient(ingredient.id),
                &ingredient.name,
                current_stock,
                ingredient.minimum_stock,
            )
            .await?;
        Ok(())
    }

    // =========================================================================
    //  RECEITAS
    // =========================================================================

    pub async fn create_recipe(&self, new: NewRecipe<'_>) -> Result<RecipeDetail, AppError> {
        check_recipe_lines(&new.lines)?;
        let (ingredient_ids, quantities): (Vec<Uuid>, Vec<Decimal>) = new.lines.iter().copied().unzip();

        let mut tx = self.pool.begin().await?;

        let recipe = self
            .repo
            .create_recipe(
                &mut *tx,
                new.product_id,
                new.name.trim(),
                new.description,
                new.preparation_time,
            )
            .await?;
        self.repo
            .replace_lines(&mut *tx, recipe.id, &ingredient_ids, &quantities)
            .await?;
        self.recalculate_in(&mut *tx, &recipe).await?;

        tx.commit().await?;
        tracing::info!("Receita '{}' criada para o produto {}", recipe.name, recipe.product_id);
        self.detail(recipe).await
    }

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        self.repo.list_recipes().await
    }

    pub async fn get_recipe(&self, id: Uuid) -> Result<RecipeDetail, AppError> {
        let recipe = self.repo.find_recipe(id).await?.ok_or(AppError::NotFound("Recipe"))?;
        self.detail(recipe).await
    }

    pub async fn replace_recipe_lines(&self, id: Uuid, lines: Vec<(Uuid, Decimal)>) -> Result<RecipeDetail, AppError> {
        check_recipe_lines(&lines)?;
        let (ingredient_ids, quantities): (Vec<Uuid>, Vec<Decimal>) = lines.into_iter().unzip();

        let mut tx = self.pool.begin().await?;
        let recipe = self
            .repo
            .find_recipe_in(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))?;

        self.repo.replace_lines(&mut *tx, id, &ingredient_ids, &quantities).await?;
        if recipe.is_active {
            self.recalculate_in(&mut *tx, &recipe).await?;
        }
        tx.commit().await?;

        self.detail(recipe).await
    }

    pub async fn deactivate_recipe(&self, id: Uuid) -> Result<Recipe, AppError> {
        self.repo
            .set_recipe_active(id, false)
            .await?
            .ok_or(AppError::NotFound("Recipe"))
    }

    async fn detail(&self, recipe: Recipe) -> Result<RecipeDetail, AppError> {
        let lines = self.repo.recipe_lines(&self.pool, recipe.id).await?;
        let (cost_per_portion, _) = cost_breakdown(&lines);
        let product_name = self.repo.product_name(recipe.product_id).await?.unwrap_or_default();
        Ok(RecipeDetail { recipe, product_name, lines, cost_per_portion })
    }

    // =========================================================================
    //  CONSUMO E CUSTO
    // =========================================================================

    /// Baixa os ingredientes de `portions` porções. Tudo ou nada: com qualquer falta,
    /// devolve a lista completa e não grava nada.
    pub async fn consume_in(
        &self,
        conn: &mut PgConnection,
        recipe: &Recipe,
        portions: Decimal,
        sale_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> Result<Vec<IngredientMovement>, AppError> {
        // Trava as linhas dos ingredientes antes de conferir o saldo
        let lines = self.repo.recipe_lines_for_update(&mut *conn, recipe.id).await?;
        let plan = plan_consumption(&lines, portions).map_err(AppError::InsufficientIngredients)?;

        let mut movements = Vec::with_capacity(plan.len());
        for step in plan {
            self.repo
                .set_ingredient_stock(&mut *conn, step.ingredient_id, step.stock_after)
                .await?;
            let movement = self
                .repo
                .record_ingredient_movement(
                    &mut *conn,
                    NewIngredientMovement {
                        ingredient_id: step.ingredient_id,
                        movement_type: IngredientMovementType::Consumption,
                        quantity: -step.quantity,
                        stock_before: step.stock_before,
                        stock_after: step.stock_after,
                        unit_price: Some(step.unit_price),
                        recipe_id: Some(recipe.id),
                        sale_id,
                        reason: None,
                        user_id,
                    },
                )
                .await?;
            movements.push(movement);

            if let Some(ingredient) = self.repo.find_ingredient_for_update(&mut *conn, step.ingredient_id).await? {
                self.evaluate_ingredient_in(&mut *conn, &ingredient, step.stock_after).await?;
            }
        }
        Ok(movements)
    }

    /// Consumo avulso (preparo sem venda). Receita desativada não baixa nada, como na venda.
    pub async fn consume(&self, recipe_id: Uuid, portions: Decimal, user_id: Uuid) -> Result<Vec<IngredientMovement>, AppError> {
        let mut tx = self.pool.begin().await?;
        let recipe = self
            .repo
            .find_recipe_in(&mut *tx, recipe_id)
            .await?
            .filter(|r| r.is_active)
            .ok_or(AppError::NotFound("Recipe"))?;
        let movements = self
            .consume_in(&mut *tx, &recipe, portions, None, Some(user_id))
            .await?;
        tx.commit().await?;
        Ok(movements)
    }

    /// Devolve ao estoque tudo o que uma venda consumiu (cancelamento).
    pub async fn return_sale_consumptions_in(
        &self,
        conn: &mut PgConnection,
        sale_id: Uuid,
        user_id: Uuid,
    ) -> Result<usize, AppError> {
        let consumptions = self.repo.sale_consumptions(&mut *conn, sale_id).await?;
        let count = consumptions.len();

        for consumed in consumptions {
            let Some(ingredient) = self
                .repo
                .find_ingredient_for_update(&mut *conn, consumed.ingredient_id)
                .await?
            else {
                continue;
            };

            // A saída foi gravada com sinal negativo
            let returned = -consumed.quantity;
            let stock_after = ingredient.current_stock + returned;
            self.repo.set_ingredient_stock(&mut *conn, ingredient.id, stock_after).await?;
            self.repo
                .record_ingredient_movement(
                    &mut *conn,
                    NewIngredientMovement {
                        ingredient_id: ingredient.id,
                        movement_type: IngredientMovementType::Return,
                        quantity: returned,
                        stock_before: ingredient.current_stock,
                        stock_after,
                        unit_price: consumed.unit_price,
                        recipe_id: consumed.recipe_id,
                        sale_id: Some(sale_id),
                        reason: Some("Estorno de venda cancelada"),
                        user_id: Some(user_id),
                    },
                )
                .await?;
            self.evaluate_ingredient_in(&mut *conn, &ingredient, stock_after).await?;
        }
        Ok(count)
    }

    /// Custo por porção = Σ quantidade × custo médio; vira o preço de custo do produto.
    pub async fn recalculate_in(&self, conn: &mut PgConnection, recipe: &Recipe) -> Result<RecipeCost, AppError> {
        let lines = self.repo.recipe_lines(&mut *conn, recipe.id).await?;
        let (cost_per_portion, cost_lines) = cost_breakdown(&lines);

        let product = self
            .product_repo
            .find_for_update(&mut *conn, recipe.product_id)
            .await?
            .ok_or(AppError::NotFound("Product"))?;
        self.product_repo
            .set_purchase_price(&mut *conn, product.id, cost_per_portion)
            .await?;

        Ok(RecipeCost {
            recipe_id: recipe.id,
            product_id: product.id,
            previous_purchase_price: product.purchase_price,
            cost_per_portion,
            lines: cost_lines,
        })
    }

    pub async fn recalculate_cost(&self, recipe_id: Uuid) -> Result<RecipeCost, AppError> {
        let mut tx = self.pool.begin().await?;
        let recipe = self
            .repo
            .find_recipe_in(&mut *tx, recipe_id)
            .await?
            .ok_or(AppError::NotFound("Recipe"))?;
        let cost = self.recalculate_in(&mut *tx, &recipe).await?;
        tx.commit().await?;
        Ok(cost)
    }

    pub async fn recalculate_all(&self) -> Result<Vec<RecipeCost>, AppError> {
        let mut tx = self.pool.begin().await?;
        let recipes = self.repo.list_active_recipes(&mut *tx).await?;

        let mut costs = Vec::with_capacity(recipes.len());
        for recipe in &recipes {
            costs.push(self.recalculate_in(&mut *tx, recipe).await?);
        }
        tx.commit().await?;

        tracing::info!("Custos recalculados para {} receitas", costs.len());
        Ok(costs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn recipe_needs_lines() {
        assert!(matches!(check_recipe_lines(&[]), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn repeated_ingredient_is_refused() {
        let lime = Uuid::new_v4();
        let lines = vec![(lime, dec!(0.5)), (Uuid::new_v4(), dec!(1)), (lime, dec!(1))];
        assert!(check_recipe_lines(&lines).is_err());
    }

    #[test]
    fn quantities_must_be_positive() {
        assert!(check_recipe_lines(&[(Uuid::new_v4(), dec!(0))]).is_err());
        assert!(check_recipe_lines(&[(Uuid::new_v4(), dec!(0.025))]).is_ok());
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn shortage_consumes_nothing(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let lime = test_support::ingredient(&state, "Limão", dec!(2), dec!(0)).await;
        let sugar = test_support::ingredient(&state, "Açúcar", dec!(0.1), dec!(0)).await;
        let dish = test_support::product(&state, "Caipirinha", dec!(0), dec!(0)).await;
        let recipe = state
            .kitchen_service
            .create_recipe(NewRecipe {
                product_id: dish.id,
                name: "Caipirinha",
                description: None,
                preparation_time: None,
                lines: vec![(lime.id, dec!(0.25)), (sugar.id, dec!(0.05))],
            })
            .await
            .unwrap();

        let err = state
            .kitchen_service
            .consume(recipe.recipe.id, dec!(3), admin.id)
            .await
            .unwrap_err();
        match err {
            AppError::InsufficientIngredients(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].ingredient_id, sugar.id);
                assert_eq!(shortages[0].required, dec!(0.15));
            }
            other => panic!("erro inesperado: {:?}", other),
        }

        // Limão tinha saldo, mas também não pode ter baixado
        for id in [lime.id, sugar.id] {
            let consumed = state
                .kitchen_service
                .ingredient_movements(id, None)
                .await
                .unwrap()
                .into_iter()
                .filter(|m| m.movement_type == IngredientMovementType::Consumption)
                .count();
            assert_eq!(consumed, 0);
        }
        assert_eq!(state.kitchen_service.get_ingredient(lime.id).await.unwrap().current_stock, dec!(2));
        assert_eq!(state.kitchen_service.get_ingredient(sugar.id).await.unwrap().current_stock, dec!(0.1));
    }

    #[sqlx::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn deactivated_recipe_cannot_be_consumed(pool: PgPool) {
        use crate::test_support;

        let state = test_support::state(pool).await;
        let admin = test_support::admin(&state).await;
        let lime = test_support::ingredient(&state, "Limão", dec!(2), dec!(0)).await;
        let (_, recipe_id) = test_support::dish(&state, lime.id, dec!(0.25)).await;

        let movements = state.kitchen_service.consume(recipe_id, dec!(1), admin.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].stock_after, dec!(1.75));

        state.kitchen_service.deactivate_recipe(recipe_id).await.unwrap();
        let err = state
            .kitchen_service
            .consume(recipe_id, dec!(1), admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Recipe")));
        assert_eq!(state.kitchen_service.get_ingredient(lime.id).await.unwrap().current_stock, dec!(1.75));
    }
}
