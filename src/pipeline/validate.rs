// src/pipeline/validate.rs

use std::path::Path;

use crate::config::load_all;
use crate::error::Result;

/// Summary of a successful validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSummary {
    pub institutions: usize,
    pub faculties: usize,
    pub campuses: usize,
}

/// Validate configuration and reference data using load_all.
pub fn run_validate(config_path: &Path, reference_path: &Path) -> Result<ValidationSummary> {
    log::info!("Validating configuration...");

    match load_all(config_path, reference_path) {
        Ok((config, registry)) => {
            log::info!("✓ Config OK");
            log::info!(
                "  thresholds: primary {}, merge {}",
                config.validation.primary_threshold,
                config.validation.merge_threshold
            );
            log::info!(
                "  llm: {} ({})",
                config.llm.model,
                if config.llm.enabled { "enabled" } else { "disabled" }
            );
            log::info!(
                "  fetcher: timeout {}s, max {} concurrent, {} retries",
                config.fetcher.timeout_secs,
                config.fetcher.max_concurrent,
                config.fetcher.max_retries
            );

            let summary = ValidationSummary {
                institutions: registry.len(),
                faculties: registry.configs().iter().map(|c| c.faculties.len()).sum(),
                campuses: registry.configs().iter().map(|c| c.campuses.len()).sum(),
            };
            log::info!("✓ Reference data OK");
            log::info!(
                "  {} institutions, {} faculties, {} campuses",
                summary.institutions,
                summary.faculties,
                summary.campuses
            );
            Ok(summary)
        }
        Err(e) => {
            log::error!("Validation failed: {e}");
            Err(e)
        }
    }
}
