//! Analysis configuration
//!
//! Process-wide settings fixed before a run starts: per-seed and per-alias
//! budgets, strong updates, aliasing switches and seeding restrictions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;

/// Upper bound for the per-seed budget (one day)
const MAX_SEED_BUDGET_MS: u64 = 86_400_000;

/// Upper bound for the phase-2 worker pool
const MAX_VALUE_WORKERS: usize = 256;

/// IDEal analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Budget per seed in milliseconds (1..=86_400_000)
    pub seed_budget_ms: u64,

    /// Budget per alias query in milliseconds (1..=seed_budget_ms)
    pub alias_budget_ms: u64,

    /// Allow seeds whose fact contains a static field
    pub enable_static_fields: bool,

    /// Kill call-to-return flow of facts strongly updated by the call
    pub enable_strong_updates: bool,

    /// Ask the alias oracle at points of alias
    pub aliasing: bool,

    /// Ask the alias oracle for facts that contain a static field
    pub aliasing_for_static_fields: bool,

    /// Only seed in application (non-library) methods
    pub seed_in_application_class_methods: bool,

    /// Phase-2 value computation threads (0 = rayon default)
    pub value_workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl AnalysisConfig {
    /// Create configuration from preset
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            seed_budget_ms: preset.seed_budget_ms(),
            alias_budget_ms: preset.alias_budget_ms(),
            enable_static_fields: true,
            enable_strong_updates: true,
            aliasing: true,
            aliasing_for_static_fields: matches!(preset, Preset::Thorough),
            seed_in_application_class_methods: false,
            value_workers: 0,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_SEED_BUDGET_MS).contains(&self.seed_budget_ms) {
            return Err(ConfigError::out_of_bounds(
                "seed_budget_ms",
                self.seed_budget_ms,
                1..=MAX_SEED_BUDGET_MS,
                "a seed needs at least one millisecond and at most a day",
            ));
        }

        if !(1..=self.seed_budget_ms).contains(&self.alias_budget_ms) {
            return Err(ConfigError::out_of_bounds(
                "alias_budget_ms",
                self.alias_budget_ms,
                1..=self.seed_budget_ms,
                "an alias query cannot outlive the seed that issued it",
            ));
        }

        if self.value_workers > MAX_VALUE_WORKERS {
            return Err(ConfigError::out_of_bounds(
                "value_workers",
                self.value_workers as u64,
                0..=MAX_VALUE_WORKERS as u64,
                "use 0 to let rayon pick the pool size",
            ));
        }

        if self.aliasing_for_static_fields && !self.aliasing {
            return Err(ConfigError::Validation(
                "aliasing_for_static_fields requires aliasing to be enabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-seed budget as a duration
    pub fn seed_budget(&self) -> Duration {
        Duration::from_millis(self.seed_budget_ms)
    }

    /// Per-alias-query budget as a duration
    pub fn alias_budget(&self) -> Duration {
        Duration::from_millis(self.alias_budget_ms)
    }

    /// Builder: Set seed_budget_ms
    pub fn seed_budget_ms(mut self, v: u64) -> Self {
        self.seed_budget_ms = v;
        self
    }

    /// Builder: Set alias_budget_ms
    pub fn alias_budget_ms(mut self, v: u64) -> Self {
        self.alias_budget_ms = v;
        self
    }

    /// Builder: Set enable_static_fields
    pub fn enable_static_fields(mut self, v: bool) -> Self {
        self.enable_static_fields = v;
        self
    }

    /// Builder: Set enable_strong_updates
    pub fn enable_strong_updates(mut self, v: bool) -> Self {
        self.enable_strong_updates = v;
        self
    }

    /// Builder: Set aliasing
    pub fn aliasing(mut self, v: bool) -> Self {
        self.aliasing = v;
        self
    }

    /// Builder: Set aliasing_for_static_fields
    pub fn aliasing_for_static_fields(mut self, v: bool) -> Self {
        self.aliasing_for_static_fields = v;
        self
    }

    /// Builder: Set seed_in_application_class_methods
    pub fn seed_in_application_class_methods(mut self, v: bool) -> Self {
        self.seed_in_application_class_methods = v;
        self
    }

    /// Builder: Set value_workers
    pub fn value_workers(mut self, v: usize) -> Self {
        self.value_workers = v;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_balanced() {
        let config = AnalysisConfig::default();
        assert_eq!(config.seed_budget_ms, 300_000);
        assert_eq!(config.alias_budget_ms, 500);
        assert!(config.enable_strong_updates);
        assert!(config.aliasing);
        assert!(!config.aliasing_for_static_fields);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_seed_budget_rejected() {
        let config = AnalysisConfig::default().seed_budget_ms(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("seed_budget_ms"));
    }

    #[test]
    fn test_alias_budget_bounded_by_seed_budget() {
        let config = AnalysisConfig::default()
            .seed_budget_ms(100)
            .alias_budget_ms(200);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alias_budget_ms"));
    }

    #[test]
    fn test_static_aliasing_requires_aliasing() {
        let config = AnalysisConfig::default()
            .aliasing(false)
            .aliasing_for_static_fields(true);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_too_many_workers_rejected() {
        let config = AnalysisConfig::default().value_workers(1024);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_thorough_preset_aliases_static_fields() {
        let config = AnalysisConfig::from_preset(Preset::Thorough);
        assert!(config.aliasing_for_static_fields);
        assert_eq!(config.seed_budget(), Duration::from_secs(3600));
    }
}
