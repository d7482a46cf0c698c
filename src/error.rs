//! Errors for the fallible edges: config documents and spawn scripts.
//!
//! The simulation itself never fails; it falls back to constants instead.

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(
        "spawn sequence entry {index} at {next} units does not come after the previous entry at {previous} units"
    )]
    UnorderedSequence { index: usize, previous: f32, next: f32 },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject non-finite or negative values for a named field
pub(crate) fn require_non_negative(field: &'static str, value: f32) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("expected a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

/// Reject non-finite or non-positive values for a named field
pub(crate) fn require_positive(field: &'static str, value: f32) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("expected a finite positive number, got {value}"),
        ));
    }
    Ok(())
}
