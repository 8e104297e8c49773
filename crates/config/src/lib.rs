//! Configuration loading, environment overrides, and validation.
//!
//! Config files: `reelsmith.toml`, `reelsmith.yaml`, or `reelsmith.json`
//! Searched in `./` then `~/.config/reelsmith/`.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, apply_env_overrides_with, config_dir, discover_and_load,
        find_config_file, load_config,
    },
    schema::{
        DEFAULT_ALLOWED_DOMAINS, I18nConfig, LimitsConfig, MediaConfig, MetricsConfig,
        ReelsmithConfig, TelegramConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_toml_str},
};
