// src/models/kitchen.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::validation::INGREDIENT_SCALE;

// --- 1. Ingredientes (matéria-prima da cozinha/bar) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    #[schema(example = "Limão")]
    pub name: String,
    #[schema(example = "kg")]
    pub unit: String,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    /// Custo médio por unidade
    pub unit_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "ingredient_movement_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientMovementType {
    Restock,
    Consumption,
    Adjustment,
    Loss,
    Return,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientMovement {
    pub id: Uuid,
    pub ingredient_id: Uuid,
    pub movement_type: IngredientMovementType,
    pub quantity: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit_price: Option<Decimal>,
    pub recipe_id: Option<Uuid>,
    pub sale_id: Option<Uuid>,
    pub reason: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- 2. Receitas (ficha técnica de um produto) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "Mojito clássico")]
    pub name: String,
    pub description: Option<String>,
    /// Tempo de preparo em minutos
    pub preparation_time: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha da receita já com os dados do ingrediente (JOIN)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit: String,
    pub quantity_per_portion: Decimal,
    pub current_stock: Decimal,
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub product_name: String,
    pub lines: Vec<RecipeLine>,
    pub cost_per_portion: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngredientShortage {
    pub ingredient_id: Uuid,
    pub name: String,
    pub required: Decimal,
    pub available: Decimal,
}

// Baixa planejada de um ingrediente
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDeduction {
    pub ingredient_id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub unit_price: Decimal,
}

/// Calcula a baixa de todos os ingredientes para `portions` porções.
/// Tudo ou nada: se faltar qualquer ingrediente, devolve a lista completa do que falta.
/// A quantidade exigida já sai na escala do estoque de ingredientes; o que arredonda para
/// zero não gera baixa.
pub fn plan_consumption(
    lines: &[RecipeLine],
    portions: Decimal,
) -> Result<Vec<PlannedDeduction>, Vec<IngredientShortage>> {
    let mut shortages = Vec::new();
    let mut plan = Vec::with_capacity(lines.len());

    for line in lines {
        let required = (line.quantity_per_portion * portions).round_dp(INGREDIENT_SCALE);
        if required.is_zero() {
            continue;
        }
        if required > line.current_stock {
            shortages.push(IngredientShortage {
                ingredient_id: line.ingredient_id,
                name: line.ingredient_name.clone(),
                required,
                available: line.current_stock,
            });
            continue;
        }
        plan.push(PlannedDeduction {
            ingredient_id: line.ingredient_id,
            name: line.ingredient_name.clone(),
            quantity: required,
            stock_before: line.current_stock,
            stock_after: line.current_stock - required,
            unit_price: line.unit_price,
        });
    }

    if shortages.is_empty() {
        Ok(plan)
    } else {
        Err(shortages)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity_per_portion: Decimal,
    pub unit_price: Decimal,
    pub line_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCost {
    pub recipe_id: Uuid,
    pub product_id: Uuid,
    pub previous_purchase_price: Decimal,
    pub cost_per_portion: Decimal,
    pub lines: Vec<CostLine>,
}

/// Custo de uma porção: Σ quantidade por porção × custo unitário, arredondado a 2 casas.
pub fn cost_breakdown(lines: &[RecipeLine]) -> (Decimal, Vec<CostLine>) {
    let cost_lines: Vec<CostLine> = lines
        .iter()
        .map(|l| CostLine {
            ingredient_id: l.ingredient_id,
            ingredient_name: l.ingredient_name.clone(),
            quantity_per_portion: l.quantity_per_portion,
            unit_price: l.unit_price,
            line_cost: l.quantity_per_portion * l.unit_price,
        })
        .collect();
    let total: Decimal = cost_lines.iter().map(|c| c.line_cost).sum();
    (total.round_dp(2), cost_lines)
}

// Resposta da reposição: o ingrediente atualizado e os custos recalculados
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestockOutcome {
    pub ingredient: Ingredient,
    pub movement: IngredientMovement,
    pub recalculated: Vec<RecipeCost>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(name: &str, per_portion: Decimal, stock: Decimal, price: Decimal) -> RecipeLine {
        RecipeLine {
            ingredient_id: Uuid::new_v4(),
            ingredient_name: name.into(),
            unit: "un".into(),
            quantity_per_portion: per_portion,
            current_stock: stock,
            unit_price: price,
        }
    }

    #[test]
    fn plan_deducts_every_line() {
        let lines = vec![
            line("Rum", dec!(0.05), dec!(1.0), dec!(8000)),
            line("Limão", dec!(0.5), dec!(10), dec!(100)),
        ];
        let plan = plan_consumption(&lines, dec!(2)).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].quantity, dec!(0.10));
        assert_eq!(plan[0].stock_after, dec!(0.90));
        assert_eq!(plan[1].stock_after, dec!(9));
    }

    #[test]
    fn plan_reports_all_shortages_at_once() {
        let lines = vec![
            line("Rum", dec!(0.05), dec!(0.01), dec!(8000)),
            line("Hortelã", dec!(1), dec!(5), dec!(10)),
            line("Açúcar", dec!(0.02), dec!(0), dec!(900)),
        ];
        let shortages = plan_consumption(&lines, dec!(1)).unwrap_err();
        assert_eq!(shortages.len(), 2);
        assert_eq!(shortages[0].name, "Rum");
        assert_eq!(shortages[0].required, dec!(0.05));
        assert_eq!(shortages[1].name, "Açúcar");
    }

    #[test]
    fn exact_stock_is_enough() {
        let lines = vec![line("Gelo", dec!(0.2), dec!(1.0), dec!(50))];
        let plan = plan_consumption(&lines, dec!(5)).unwrap();
        assert_eq!(plan[0].stock_after, Decimal::ZERO);
    }

    #[test]
    fn planned_deduction_fits_the_stock_column() {
        // 0.0333 x 1.5 = 0.04995 -> 0.0500 (banker's rounding na 4a casa)
        let lines = vec![
            line("Xarope", dec!(0.0333), dec!(1), dec!(20)),
            line("Sal", dec!(0.0001), dec!(1), dec!(5)),
        ];
        let plan = plan_consumption(&lines, dec!(1.5)).unwrap();
        assert_eq!(plan[0].quantity, dec!(0.05));
        assert!(plan[0].quantity.normalize().scale() <= INGREDIENT_SCALE);
        assert_eq!(plan[0].stock_before - plan[0].quantity, plan[0].stock_after);
        assert_eq!(plan[1].quantity, dec!(0.0002));

        // 0.0001 x 0.001 some na escala: nenhuma baixa
        let tiny = vec![line("Sal", dec!(0.0001), dec!(1), dec!(5))];
        assert!(plan_consumption(&tiny, dec!(0.001)).unwrap().is_empty());
    }

    #[test]
    fn cost_is_sum_of_quantity_times_price() {
        let lines = vec![
            line("Rum", dec!(0.05), dec!(1), dec!(8000)),
            line("Limão", dec!(0.5), dec!(10), dec!(100)),
            line("Açúcar", dec!(0.015), dec!(2), dec!(900)),
        ];
        let (cost, breakdown) = cost_breakdown(&lines);
        // 400 + 50 + 13.5
        assert_eq!(cost, dec!(463.50));
        assert_eq!(breakdown[2].line_cost, dec!(13.5));
    }

    #[test]
    fn recipe_without_lines_costs_nothing() {
        let (cost, breakdown) = cost_breakdown(&[]);
        assert_eq!(cost, Decimal::ZERO);
        assert!(breakdown.is_empty());
    }

    proptest! {
        #[test]
        fn planned_stock_never_goes_negative(
            per_portion in 1u32..500,
            stock in 0u32..10_000,
            portions in 1u32..20,
        ) {
            let lines = vec![line("X", per_portion.into(), stock.into(), dec!(1))];
            match plan_consumption(&lines, portions.into()) {
                Ok(plan) => prop_assert!(plan[0].stock_after >= Decimal::ZERO),
                Err(short) => prop_assert!(short[0].required > short[0].available),
            }
        }
    }
}
