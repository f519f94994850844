// src/handlers/mod.rs

use rust_decimal::Decimal;
use validator::ValidationError;

pub mod ingredients;
pub mod inventory;
pub mod sales;

// ---
// Validações customizadas compartilhadas pelos payloads
// ---

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("El valor no puede ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_not_zero(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("La cantidad no puede ser cero.".into());
        return Err(err);
    }
    Ok(())
}

// Colunas de estoque são NUMERIC(14,3): mais casas seriam arredondadas pelo banco.
const STOCK_SCALE: u32 = 3;

fn validate_stock_scale(val: &Decimal) -> Result<(), ValidationError> {
    if val.normalize().scale() > STOCK_SCALE {
        let mut err = ValidationError::new("scale");
        err.add_param("max".into(), &STOCK_SCALE);
        err.message = Some("La cantidad admite como máximo 3 decimales.".into());
        return Err(err);
    }
    Ok(())
}

/// Estoque absoluto: não negativo, até três casas.
pub(crate) fn validate_stock_level(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_negative(val)?;
    validate_stock_scale(val)
}

/// Delta manual: diferente de zero, até três casas.
pub(crate) fn validate_stock_delta(val: &Decimal) -> Result<(), ValidationError> {
    validate_not_zero(val)?;
    validate_stock_scale(val)
}

pub(crate) fn validate_percentage(val: &Decimal) -> Result<(), ValidationError> {
    if *val < Decimal::ZERO || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0);
        err.add_param("max".into(), &100);
        err.message = Some("El descuento debe estar entre 0 y 100.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_are_rejected_but_zero_is_fine() {
        assert!(validate_not_negative(&Decimal::from(-1)).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::new(25, 1)).is_ok());
    }

    #[test]
    fn zero_delta_is_rejected() {
        assert!(validate_not_zero(&Decimal::ZERO).is_err());
        assert!(validate_not_zero(&Decimal::from(-2)).is_ok());
    }

    #[test]
    fn stock_values_beyond_three_decimals_are_rejected() {
        // 0.0004 viraria 0.000 na coluna e gravaria um movimento nulo.
        assert_eq!(validate_stock_delta(&Decimal::new(4, 4)).unwrap_err().code, "scale");
        assert!(validate_stock_delta(&Decimal::new(-125, 3)).is_ok());
        // Zeros à direita não contam.
        assert!(validate_stock_delta(&Decimal::new(15000, 4)).is_ok());
        assert!(validate_stock_level(&Decimal::new(12345, 4)).is_err());
        assert!(validate_stock_level(&Decimal::from(-1)).is_err());
        assert!(validate_stock_level(&Decimal::ZERO).is_ok());
    }

    #[test]
    fn discount_must_be_a_percentage() {
        assert!(validate_percentage(&Decimal::ZERO).is_ok());
        assert!(validate_percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_percentage(&Decimal::new(1001, 1)).is_err());
        assert!(validate_percentage(&Decimal::from(-5)).is_err());
    }
}
