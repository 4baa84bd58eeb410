use crate::utils::error::{PropsError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number greater than zero".to_string(),
        });
    }
    Ok(())
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number, zero or greater".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Channel lists are 1-based, non-empty and free of duplicates.
pub fn validate_channels(field_name: &str, channels: &[u16]) -> Result<()> {
    if channels.is_empty() {
        return Err(PropsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "At least one channel is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for &channel in channels {
        if channel == 0 {
            return Err(PropsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format!("{:?}", channels),
                reason: "Channels are numbered from 1".to_string(),
            });
        }
        if !seen.insert(channel) {
            return Err(PropsError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format!("{:?}", channels),
                reason: format!("Channel {} is listed more than once", channel),
            });
        }
    }

    Ok(())
}
