//! Error types.
//!
//! Only configuration can fail. Runtime conditions (unreachable goals, vanished
//! nodes, physics divergence) degrade to "no path" or "respawn" and never surface
//! as errors.

/// Rejected tuning value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("`{field}` must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("`{field}` must lie in {min}..{max} degrees, got {value}")]
    AngleOutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("`{smaller}` ({smaller_value}) must not exceed `{larger}` ({larger_value})")]
    Inconsistent {
        smaller: &'static str,
        smaller_value: f32,
        larger: &'static str,
        larger_value: f32,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Validation helpers shared by the config structs.
pub(crate) fn finite(field: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<f32> {
    let value = finite(field, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<f32> {
    let value = finite(field, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

pub(crate) fn angle_deg(field: &'static str, value: f32) -> Result<f32> {
    let value = finite(field, value)?;
    if (0.0..90.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::AngleOutOfRange {
            field,
            value,
            min: 0.0,
            max: 90.0,
        })
    }
}
