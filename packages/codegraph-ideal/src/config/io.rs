//! Configuration I/O (YAML loading)
//!
//! YAML schema v1:
//!
//! ```yaml
//! version: 1
//! preset: fast
//! overrides:
//!   alias_budget_ms: 50
//!   enable_strong_updates: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::analysis_config::AnalysisConfig;
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;

const SUPPORTED_VERSIONS: [u32; 1] = [1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    #[serde(default)]
    pub preset: Preset,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<AnalysisConfigPatch>,
}

/// Partial configuration applied on top of a preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_budget_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias_budget_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_static_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_strong_updates: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliasing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliasing_for_static_fields: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_in_application_class_methods: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_workers: Option<usize>,
}

impl AnalysisConfigPatch {
    /// Apply every present field to `config`
    pub fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(v) = self.seed_budget_ms {
            config.seed_budget_ms = v;
        }
        if let Some(v) = self.alias_budget_ms {
            config.alias_budget_ms = v;
        }
        if let Some(v) = self.enable_static_fields {
            config.enable_static_fields = v;
        }
        if let Some(v) = self.enable_strong_updates {
            config.enable_strong_updates = v;
        }
        if let Some(v) = self.aliasing {
            config.aliasing = v;
        }
        if let Some(v) = self.aliasing_for_static_fields {
            config.aliasing_for_static_fields = v;
        }
        if let Some(v) = self.seed_in_application_class_methods {
            config.seed_in_application_class_methods = v;
        }
        if let Some(v) = self.value_workers {
            config.value_workers = v;
        }
        config
    }

    /// Patch that reproduces `config` from scratch
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            seed_budget_ms: Some(config.seed_budget_ms),
            alias_budget_ms: Some(config.alias_budget_ms),
            enable_static_fields: Some(config.enable_static_fields),
            enable_strong_updates: Some(config.enable_strong_updates),
            aliasing: Some(config.aliasing),
            aliasing_for_static_fields: Some(config.aliasing_for_static_fields),
            seed_in_application_class_methods: Some(config.seed_in_application_class_methods),
            value_workers: Some(config.value_workers),
        }
    }
}

impl AnalysisConfig {
    /// Load and validate a configuration from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let base = AnalysisConfig::from_preset(export.preset);
        let config = match export.overrides {
            Some(patch) => patch.apply(base),
            None => base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as YAML (schema v1, balanced preset plus full overrides)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: Preset::Balanced,
            overrides: Some(AnalysisConfigPatch::from_config(self)),
        };

        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}
