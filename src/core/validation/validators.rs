//! Reusable field validators for `#[validate(custom(function = ...))]`

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Largest price or amount accepted from a request
///
/// Keeps `price × quantity` and revenue sums far away from `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

fn within_max(value: &Decimal) -> Result<(), ValidationError> {
    if *value > MAX_AMOUNT {
        Err(error("max_amount", "must not exceed 10000000"))
    } else {
        Ok(())
    }
}

/// Validator: amount must be strictly positive and at most [`MAX_AMOUNT`]
pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        within_max(value)
    } else {
        Err(error("positive", "must be greater than zero"))
    }
}

/// Validator: amount must be zero or more and at most [`MAX_AMOUNT`]
pub fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(error("non_negative", "must not be negative"))
    } else {
        within_max(value)
    }
}

/// Validator: string must contain something other than whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("not_blank", "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_amount() {
        assert!(positive_amount(&Decimal::new(1, 2)).is_ok());
        assert!(positive_amount(&MAX_AMOUNT).is_ok());
        assert!(positive_amount(&Decimal::ZERO).is_err());
        assert!(positive_amount(&Decimal::new(-5, 0)).is_err());
    }

    #[test]
    fn test_non_negative_amount() {
        assert!(non_negative_amount(&Decimal::ZERO).is_ok());
        assert!(non_negative_amount(&Decimal::new(-1, 1)).is_err());
    }

    #[test]
    fn test_amount_above_max_is_rejected() {
        let huge = Decimal::from_scientific("5e28").unwrap();
        let err = positive_amount(&huge).unwrap_err();
        assert_eq!(err.code, "max_amount");
        assert!(non_negative_amount(&huge).is_err());
        assert!(positive_amount(&(MAX_AMOUNT + Decimal::new(1, 2))).is_err());
        assert_eq!(MAX_AMOUNT, Decimal::new(10_000_000, 0));
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Dal").is_ok());
        assert!(not_blank("   ").is_err());
    }
}
