// src/config.rs

//! Configuration loading utilities.
//!
//! This module provides convenience functions for loading configuration
//! and reference institution data from files.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::services::ReferenceConfigRegistry;

/// Load configuration from a TOML file and check it.
///
/// Falls back to defaults if the file is missing or unreadable; a file that
/// loads but holds out-of-range values is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load_or_default(path);
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid config {}: {e}", path.display())))?;
    Ok(config)
}

/// Load reference institution data into a registry.
///
/// Unlike the config, reference data has no sensible default: a missing or
/// malformed file is an error.
pub fn load_reference(path: &Path) -> Result<ReferenceConfigRegistry> {
    ReferenceConfigRegistry::load(path).map_err(|e| {
        AppError::config(format!(
            "Invalid reference data {}: {e}",
            path.display()
        ))
    })
}

/// Load and validate both config and reference data.
pub fn load_all(config_path: &Path, reference_path: &Path) -> Result<(Config, ReferenceConfigRegistry)> {
    let config = load_config(config_path)?;
    let registry = load_reference(reference_path)?;
    Ok((config, registry))
}
