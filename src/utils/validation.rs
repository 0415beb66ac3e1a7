use rust_decimal::Decimal;

use crate::error::{AppError, Result};

/// Trims and requires a non-empty value.
pub fn required_text(field: &str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::validation(field, format!("{} is required", field))),
    }
}

/// Trims; blank values count as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn validate_email(field: &str, value: Option<&str>) -> Result<String> {
    let email = required_text(field, value)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(AppError::validation(field, "Invalid email address"));
    }

    Ok(email)
}

pub fn non_negative_amount(field: &str, amount: Decimal) -> Result<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::validation(field, format!("{} must not be negative", field)));
    }
    Ok(amount)
}

/// Non-negative and no larger than `max`.
pub fn bounded_amount(field: &str, amount: Decimal, max: Decimal) -> Result<Decimal> {
    let amount = non_negative_amount(field, amount)?;
    if amount > max {
        return Err(AppError::validation(
            field,
            format!("{} must not exceed {}", field, max),
        ));
    }
    Ok(amount)
}

pub fn non_negative_count(field: &str, count: i32) -> Result<i32> {
    if count < 0 {
        return Err(AppError::validation(field, format!("{} must not be negative", field)));
    }
    Ok(count)
}
