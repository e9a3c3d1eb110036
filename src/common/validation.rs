// src/common/validation.rs

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

// Casas decimais das colunas NUMERIC (ver migrations/)
/// Estoque de produtos e quantidades vendidas/compradas.
pub const STOCK_SCALE: u32 = 3;
/// Preços de venda, descontos, totais e despesas.
pub const MONEY_SCALE: u32 = 2;
/// Custos unitários (preço de custo, custo médio).
pub const COST_SCALE: u32 = 4;
/// Estoque e quantidades de ingredientes.
pub const INGREDIENT_SCALE: u32 = 4;

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// 1.500 tem escala 1 depois de normalizado; só conta o que o banco arredondaria
fn validate_scale(val: &Decimal, max: u32) -> Result<(), ValidationError> {
    if val.normalize().scale() > max {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &max);
        err.message = Some(format!("Use no máximo {} casas decimais.", max).into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    validate_scale(val, STOCK_SCALE)
}

pub fn validate_stock_level(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_scale(val, STOCK_SCALE)
}

pub fn validate_stock_delta(val: &Decimal) -> Result<(), ValidationError> {
    validate_scale(val, STOCK_SCALE)
}

pub fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_scale(val, MONEY_SCALE)
}

pub fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    validate_scale(val, MONEY_SCALE)
}

pub fn validate_cost(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_scale(val, COST_SCALE)
}

pub fn validate_ingredient_quantity(val: &Decimal) -> Result<(), ValidationError> {
    validate_positive(val)?;
    validate_scale(val, INGREDIENT_SCALE)
}

pub fn validate_ingredient_level(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_scale(val, INGREDIENT_SCALE)
}

pub fn validate_ingredient_delta(val: &Decimal) -> Result<(), ValidationError> {
    validate_scale(val, INGREDIENT_SCALE)
}

/// Monta um `ValidationErrors` com um único campo, para regras que o derive não cobre.
pub fn field_error(field: &'static str, code: &'static str, message: &str) -> ValidationErrors {
    let mut err = ValidationError::new(code);
    err.message = Some(message.to_string().into());
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}

/// Mesma regra de escala para valores que chegam aos serviços sem passar por um payload.
pub fn ensure_scale(field: &'static str, val: Decimal, max: u32) -> Result<(), ValidationErrors> {
    validate_scale(&val, max).map_err(|err| {
        let mut errors = ValidationErrors::new();
        errors.add(field, err);
        errors
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_is_not_negative_but_not_positive() {
        assert!(validate_not_negative(&dec!(0)).is_ok());
        assert!(validate_not_negative(&dec!(-0.01)).is_err());
        assert!(validate_positive(&dec!(0)).is_err());
        assert!(validate_positive(&dec!(0.5)).is_ok());
    }

    #[test]
    fn values_finer_than_the_column_are_rejected() {
        // NUMERIC(14,3) arredondaria 0.0005 para 0.001 (ou 0.000)
        assert!(validate_quantity(&dec!(0.0005)).is_err());
        assert!(validate_quantity(&dec!(0.001)).is_ok());
        // 0.335 viraria 0.34 num preço de venda
        let err = validate_price(&dec!(0.335)).unwrap_err();
        assert_eq!(err.code, "scale");
        assert!(validate_price(&dec!(0.34)).is_ok());
        assert!(validate_cost(&dec!(0.3355)).is_ok());
        assert!(validate_cost(&dec!(0.33555)).is_err());
        assert!(validate_ingredient_quantity(&dec!(0.0001)).is_ok());
        assert!(validate_ingredient_delta(&dec!(-0.00001)).is_err());
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert!(validate_quantity(&dec!(3.000000)).is_ok());
        assert!(validate_amount(&dec!(35000.0000)).is_ok());
        assert!(validate_stock_delta(&dec!(-2.50000)).is_ok());
    }

    #[test]
    fn sign_is_checked_before_scale() {
        assert_eq!(validate_quantity(&dec!(-0.00001)).unwrap_err().code, "range");
        assert_eq!(validate_stock_level(&dec!(-1)).unwrap_err().code, "range");
    }

    #[test]
    fn ensure_scale_names_the_field() {
        let errors = ensure_scale("quantity", dec!(0.0005), STOCK_SCALE).unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));
        assert!(ensure_scale("quantity", dec!(-0.001), STOCK_SCALE).is_ok());
    }
}
