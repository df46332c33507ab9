//! Preset configurations
//!
//! Presets bundle seed and alias budgets for common use cases.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// CI/CD: short budgets, aliasing only for locals
    ///
    /// - Seed budget: 10s
    /// - Alias budget: 100ms
    Fast,

    /// Development: the defaults
    ///
    /// - Seed budget: 300s
    /// - Alias budget: 500ms
    Balanced,

    /// Audit: long budgets, static fields aliased as well
    ///
    /// - Seed budget: 1h
    /// - Alias budget: 5s
    Thorough,
}

impl Preset {
    /// Per-seed budget in milliseconds
    pub fn seed_budget_ms(&self) -> u64 {
        match self {
            Self::Fast => 10_000,
            Self::Balanced => 300_000,
            Self::Thorough => 3_600_000,
        }
    }

    /// Per-alias-query budget in milliseconds
    pub fn alias_budget_ms(&self) -> u64 {
        match self {
            Self::Fast => 100,
            Self::Balanced => 500,
            Self::Thorough => 5_000,
        }
    }

    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
