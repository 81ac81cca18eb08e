//! 输入校验

use crate::error::{CommerceError, CommerceResult};

/// Maximum quantity per line
pub const MAX_QUANTITY: i64 = 9999;
/// Maximum payment amount accepted on proof upload
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000_000_000.0;
/// Maximum length of free-text fields (notes, address, method)
pub const MAX_TEXT_LEN: usize = 2000;

pub fn validate_quantity(quantity: i64) -> CommerceResult<()> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(CommerceError::InvalidQuantity {
            got: quantity,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Parse a claimed amount (multipart text field)
pub fn parse_amount(raw: &str) -> CommerceResult<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| CommerceError::InvalidAmount(format!("amount is not a number: {raw}")))?;
    validate_amount(amount)?;
    Ok(amount)
}

pub fn validate_amount(amount: f64) -> CommerceResult<()> {
    if !amount.is_finite() {
        return Err(CommerceError::InvalidAmount(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount <= 0.0 {
        return Err(CommerceError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(CommerceError::InvalidAmount(format!(
            "amount exceeds maximum allowed ({MAX_PAYMENT_AMOUNT}), got {amount}"
        )));
    }
    Ok(())
}

/// Trim optional text; empty becomes `None`
pub fn normalize_text(field: &str, value: Option<String>) -> CommerceResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(CommerceError::InvalidArgument(format!(
            "{field} exceeds {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}
