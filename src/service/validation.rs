//! Field checks for request payloads. Messages name the JSON field.

use crate::error::AppError;
use regex::Regex;

/// Trimmed value of a required text field.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn matches(field: &str, value: &str, pattern: &Regex) -> Result<(), AppError> {
    if !pattern.is_match(value) {
        return Err(AppError::Validation(format!(
            "{} does not match required pattern",
            field
        )));
    }
    Ok(())
}

pub fn minimum(field: &str, value: Option<f64>, min: f64) -> Result<(), AppError> {
    if let Some(n) = value {
        if n < min {
            return Err(AppError::Validation(format!("{} must be at least {}", field, min)));
        }
    }
    Ok(())
}

pub fn range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), AppError> {
    if let Some(n) = value {
        if n < min || n > max {
            return Err(AppError::Validation(format!(
                "{} must be between {} and {}",
                field, min, max
            )));
        }
    }
    Ok(())
}

pub fn one_of<T: PartialEq + std::fmt::Debug>(field: &str, value: &T, allowed: &[T]) -> Result<(), AppError> {
    if !allowed.contains(value) {
        return Err(AppError::Validation(format!(
            "{} must be one of: {:?}",
            field, allowed
        )));
    }
    Ok(())
}
