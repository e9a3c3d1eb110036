// src/db/kitchen_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::kitchen::{Ingredient, IngredientMovement, IngredientMovementType, Recipe, RecipeLine},
};

pub struct NewIngredientMovement<'a> {
    pub ingredient_id: Uuid,
    pub movement_type: IngredientMovementType,
    pub quantity: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit_price: Option<Decimal>,
    pub recipe_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub reason: Option<&'a str>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default)]
pub struct IngredientChanges {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

// Colunas da linha de receita + dados do ingrediente
const RECIPE_LINE_SELECT: &str = r#"
    SELECT ri.ingredient_id,
           i.name AS ingredient_name,
           i.unit,
           ri.quantity_per_portion,
           i.current_stock,
           i.unit_price
    FROM recipe_ingredients ri
    JOIN ingredients i ON i.id = ri.ingredient_id
    WHERE ri.recipe_id = $1
    ORDER BY i.name ASC
"#;

#[derive(Clone)]
pub struct KitchenRepository {
    pool: PgPool,
}

impl KitchenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  INGREDIENTES
    // =========================================================================

    pub async fn create_ingredient<'e, E>(
        &self,
        executor: E,
        name: &str,
        unit: &str,
        current_stock: Decimal,
        minimum_stock: Decimal,
        unit_price: Decimal,
    ) -> Result<Ingredient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Ingredient>(
            r#"
            INSERT INTO ingredients (name, unit, current_stock, minimum_stock, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(name)
            .bind(unit)
            .bind(current_stock)
            .bind(minimum_stock)
            .bind(unit_price)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Ingredient",
                            name: name.to_string(),
                        };
                    }
                }
                e.into()
            })
    }

    pub async fn list_ingredients(&self, only_active: bool) -> Result<Vec<Ingredient>, AppError> {
        let rows = sqlx::query_as::<_, Ingredient>(
            "SELECT * FROM ingredients WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY name ASC",
        )
            .bind(only_active)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_active_ingredients<'e, E>(&self, executor: E) -> Result<Vec<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE is_active = TRUE")
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_ingredient(&self, id: Uuid) -> Result<Option<Ingredient>, AppError> {
        let row = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_ingredient_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Ingredient>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Ingredient>("SELECT * FROM ingredients WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn update_ingredient(&self, id: Uuid, changes: &IngredientChanges) -> Result<Option<Ingredient>, AppError> {
        let row = sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients SET
                name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                minimum_stock = COALESCE($4, minimum_stock),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.unit.as_deref())
            .bind(changes.minimum_stock)
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn set_ingredient_stock<'e, E>(&self, executor: E, id: Uuid, stock: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE ingredients SET current_stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(stock)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn set_ingredient_stock_and_price<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stock: Decimal,
        unit_price: Decimal,
    ) -> Result<Ingredient, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Ingredient>(
            r#"
            UPDATE ingredients
            SET current_stock = $2, unit_price = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(id)
            .bind(stock)
            .bind(unit_price)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn record_ingredient_movement<'e, E>(
        &self,
        executor: E,
        movement: NewIngredientMovement<'_>,
    ) -> Result<IngredientMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, IngredientMovement>(
            r#"
            INSERT INTO ingredient_movements (
                ingredient_id, movement_type, quantity, stock_before, stock_after,
                unit_price, recipe_id, sale_id, reason, user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
            .bind(movement.ingredient_id)
            .bind(movement.movement_type)
            .bind(movement.quantity)
            .bind(movement.stock_before)
            .bind(movement.stock_after)
            .bind(movement.unit_price)
            .bind(movement.recipe_id)
            .bind(movement.sale_id)
            .bind(movement.reason)
            .bind(movement.user_id)
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_ingredient_movements(&self, ingredient_id: Uuid, limit: i64) -> Result<Vec<IngredientMovement>, AppError> {
        let rows = sqlx::query_as::<_, IngredientMovement>(
            r#"
            SELECT * FROM ingredient_movements
            WHERE ingredient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
            .bind(ingredient_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Consumos de ingredientes feitos por uma venda (para estorno).
    pub async fn sale_consumptions<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Vec<IngredientMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, IngredientMovement>(
            r#"
            SELECT * FROM ingredient_movements
            WHERE sale_id = $1 AND movement_type = 'CONSUMPTION'
            ORDER BY created_at ASC
            "#,
        )
            .bind(sale_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // =========================================================================
    //  RECEITAS
    // =========================================================================

    pub async fn create_recipe<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        name: &str,
        description: Option<&str>,
        preparation_time: Option<i32>,
    ) -> Result<Recipe, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (product_id, name, description, preparation_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(product_id)
            .bind(name)
            .bind(description)
            .bind(preparation_time)
            .fetch_one(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::RecipeAlreadyExists;
                    }
                    if db_err.is_foreign_key_violation() {
                        return AppError::NotFound("Product");
                    }
                }
                e.into()
            })
    }

    /// Troca todas as linhas da receita de uma vez.
    pub async fn replace_lines<'e, E>(
        &self,
        executor: E,
        recipe_id: Uuid,
        ingredient_ids: &[Uuid],
        quantities: &[Decimal],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Um único statement: apaga as linhas antigas e insere as novas
        sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM recipe_ingredients WHERE recipe_id = $1
            )
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity_per_portion)
            SELECT $1, t.ingredient_id, t.quantity
            FROM unnest($2::uuid[], $3::numeric[]) AS t(ingredient_id, quantity)
            "#,
        )
            .bind(recipe_id)
            .bind(ingredient_ids)
            .bind(quantities)
            .execute(executor)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::NotFound("Ingredient");
                    }
                    if db_err.is_unique_violation() {
                        return AppError::AlreadyExists {
                            resource: "Recipe line",
                            name: recipe_id.to_string(),
                        };
                    }
                }
                e.into()
            })?;
        Ok(())
    }

    pub async fn find_recipe(&self, id: Uuid) -> Result<Option<Recipe>, AppError> {
        let row = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn find_recipe_in<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn find_active_recipe_by_product<'e, E>(&self, executor: E, product_id: Uuid) -> Result<Option<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Recipe>(
            "SELECT * FROM recipes WHERE product_id = $1 AND is_active = TRUE",
        )
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, AppError> {
        let rows = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_active_recipes<'e, E>(&self, executor: E) -> Result<Vec<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE is_active = TRUE")
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn recipes_using_ingredient<'e, E>(&self, executor: E, ingredient_id: Uuid) -> Result<Vec<Recipe>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT r.* FROM recipes r
            JOIN recipe_ingredients ri ON ri.recipe_id = r.id
            WHERE ri.ingredient_id = $1 AND r.is_active = TRUE
            "#,
        )
            .bind(ingredient_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn set_recipe_active(&self, id: Uuid, is_active: bool) -> Result<Option<Recipe>, AppError> {
        let row = sqlx::query_as::<_, Recipe>(
            "UPDATE recipes SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn recipe_lines<'e, E>(&self, executor: E, recipe_id: Uuid) -> Result<Vec<RecipeLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, RecipeLine>(RECIPE_LINE_SELECT)
            .bind(recipe_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Mesmas linhas, mas travando os ingredientes até o fim da transação.
    pub async fn recipe_lines_for_update<'e, E>(&self, executor: E, recipe_id: Uuid) -> Result<Vec<RecipeLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} FOR UPDATE OF i", RECIPE_LINE_SELECT);
        let rows = sqlx::query_as::<_, RecipeLine>(&sql)
            .bind(recipe_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn product_has_recipe(&self, product_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM recipes WHERE product_id = $1 AND is_active = TRUE)",
        )
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn product_name(&self, product_id: Uuid) -> Result<Option<String>, AppError> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
