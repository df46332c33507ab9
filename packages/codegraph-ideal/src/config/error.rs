//! Configuration errors

use thiserror::Error;

/// Everything that can go wrong while loading or checking an [`AnalysisConfig`]
///
/// [`AnalysisConfig`]: super::AnalysisConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric field outside its accepted bounds
    #[error("{field} = {value} is out of bounds {min}..={max}: {hint}")]
    Range {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
        hint: &'static str,
    },

    #[error("config version {found} is not supported (expected one of {supported:?})")]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("unknown preset '{0}' (fast, balanced, thorough)")]
    UnknownPreset(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Fields that are individually valid but contradict each other
    #[error("inconsistent config: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    pub(crate) fn out_of_bounds(
        field: &'static str,
        value: u64,
        bounds: std::ops::RangeInclusive<u64>,
        hint: &'static str,
    ) -> Self {
        Self::Range {
            field,
            value,
            min: *bounds.start(),
            max: *bounds.end(),
            hint,
        }
    }
}
