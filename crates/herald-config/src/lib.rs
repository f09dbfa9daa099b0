// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Herald bot.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides. Required values missing at startup produce a
//! rendered error list and a non-zero exit.
//!
//! # Usage
//!
//! ```no_run
//! let config = herald_config::load_and_validate().expect("config errors");
//! println!("model: {}", config.gemini.model);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::HeraldConfig;
pub use validation::{ConfigError, validate_config};

/// Load configuration from the XDG hierarchy and validate it.
///
/// The high-level entry point used by the binary:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. Runs post-deserialization validation
/// 3. Collapses both failure shapes into a `Vec<ConfigError>`
pub fn load_and_validate() -> Result<HeraldConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<HeraldConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(figment_to_config_errors(err)),
    }
}

/// Prints a numbered error list to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprintln!("herald: configuration is invalid:");
    for (i, err) in errors.iter().enumerate() {
        eprintln!("  {}. {err}", i + 1);
    }
}

/// Converts a Figment extraction error into the common error list shape.
fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| ConfigError::Invalid {
            key: e.path.join("."),
            reason: e.kind.to_string(),
        })
        .collect()
}
