// src/models/products.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Cervejas")]
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// Produto vendável (bebida, prato...). O estoque fica no próprio produto.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    #[schema(example = "Heineken 33cl")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "bottle")]
    pub unit: String,
    #[schema(example = "450.00")]
    pub purchase_price: Decimal,
    #[schema(example = "800.00")]
    pub selling_price: Decimal,
    #[schema(example = "48")]
    pub current_stock: Decimal,
    #[schema(example = "12")]
    pub minimum_stock: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn margin(&self) -> Decimal {
        self.selling_price - self.purchase_price
    }

    /// Margem sobre o preço de venda, em %. Zero quando o produto não tem preço.
    pub fn margin_percent(&self) -> Decimal {
        if self.selling_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.margin() * Decimal::ONE_HUNDRED / self.selling_price).round_dp(2)
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
    pub margin: Decimal,
    pub margin_percent: Decimal,
    pub has_recipe: bool,
    pub is_low_stock: bool,
}

impl ProductDetail {
    pub fn new(product: Product, category_name: String, has_recipe: bool) -> Self {
        Self {
            margin: product.margin(),
            margin_percent: product.margin_percent(),
            is_low_stock: product.is_low_stock(),
            product,
            category_name,
            has_recipe,
        }
    }
}

// Campos opcionais: só o que vier é alterado
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub minimum_stock: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub low_stock: Option<bool>,
    /// Busca parcial pelo nome
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(purchase: Decimal, selling: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Mojito".into(),
            description: None,
            unit: "glass".into(),
            purchase_price: purchase,
            selling_price: selling,
            current_stock: dec!(5),
            minimum_stock: dec!(5),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn margin_is_relative_to_selling_price() {
        let p = product(dec!(450), dec!(800));
        assert_eq!(p.margin(), dec!(350));
        assert_eq!(p.margin_percent(), dec!(43.75));
    }

    #[test]
    fn free_product_has_zero_margin_percent() {
        let p = product(dec!(100), dec!(0));
        assert_eq!(p.margin_percent(), Decimal::ZERO);
    }

    #[test]
    fn stock_equal_to_minimum_counts_as_low() {
        let p = product(dec!(1), dec!(2));
        assert!(p.is_low_stock());
        let detail = ProductDetail::new(p, "Cocktails".into(), true);
        assert!(detail.is_low_stock);
        assert!(detail.has_recipe);
    }
}
