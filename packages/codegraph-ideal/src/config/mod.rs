//! Configuration system
//!
//! Two tiers, mirroring the pipeline configuration:
//! - Level 1: Preset (budgets for fast / balanced / thorough runs)
//! - Level 2: YAML overrides or builder setters for individual fields
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_ideal::config::{AnalysisConfig, Preset};
//!
//! let config = AnalysisConfig::from_preset(Preset::Fast)
//!     .alias_budget_ms(50)
//!     .enable_strong_updates(false);
//! config.validate()?;
//!
//! let config = AnalysisConfig::from_yaml_file("ideal.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod io;
pub mod preset;

// Re-exports
pub use analysis_config::AnalysisConfig;
pub use error::{ConfigError, ConfigResult};
pub use io::{AnalysisConfigPatch, ConfigExportV1};
pub use preset::Preset;
