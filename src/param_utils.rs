use crate::error::ConfigError;
use std::collections::HashMap;

/// Extract a parameter as a whole number with a default value.
/// Non-finite or fractional values are rejected.
pub fn get_param_i64(
    params: &HashMap<String, f64>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(&raw) = params.get(key) else {
        return Ok(default);
    };
    if !raw.is_finite() || raw.fract() != 0.0 {
        return Err(ConfigError::InvalidParameter {
            name: key.to_string(),
            value: raw,
        });
    }
    Ok(raw as i64)
}

/// Extract a percentage parameter that must not be negative
pub fn get_percentage_param(
    params: &HashMap<String, f64>,
    key: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let value = get_param_i64(params, key, default)?;
    if value < 0 {
        return Err(ConfigError::NegativePercentage {
            name: key.to_string(),
            value,
        });
    }
    Ok(value)
}
