// src/services/registry.rs

//! Reference config registry.
//!
//! Maps institution domains to their curated reference records. Built once at
//! startup and shared read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::models::{ReferenceInstitutionConfig, load_reference_configs};
use crate::utils::{host_of, toggle_www};

/// Domain → institution lookup with www-normalization and subdomain collapsing.
#[derive(Debug, Default)]
pub struct ReferenceConfigRegistry {
    configs: Vec<ReferenceInstitutionConfig>,
    by_domain: HashMap<String, usize>,
}

impl ReferenceConfigRegistry {
    /// Build the registry from loaded records.
    ///
    /// Every domain is registered verbatim and with `www.` toggled, lowercased.
    /// When two institutions claim the same domain the first one keeps it.
    pub fn new(configs: Vec<ReferenceInstitutionConfig>) -> Self {
        let mut by_domain: HashMap<String, usize> = HashMap::new();

        for (idx, config) in configs.iter().enumerate() {
            for domain in &config.domains {
                let domain = domain.trim().to_lowercase();
                if domain.is_empty() {
                    continue;
                }
                let toggled = toggle_www(&domain);
                for key in [domain, toggled] {
                    if let Some(&owner) = by_domain.get(&key) {
                        if owner != idx {
                            log::warn!(
                                "Domain {} claimed by both {} and {}; keeping {}",
                                key,
                                configs[owner].name,
                                config.name,
                                configs[owner].name
                            );
                        }
                        continue;
                    }
                    by_domain.insert(key, idx);
                }
            }
        }

        Self { configs, by_domain }
    }

    /// Load records from a JSON file and build the registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let configs = load_reference_configs(path)?;
        log::info!("Loaded {} reference institution(s)", configs.len());
        Ok(Self::new(configs))
    }

    /// Resolve a URL or bare domain to its institution record.
    pub fn resolve(&self, url_or_domain: &str) -> Option<&ReferenceInstitutionConfig> {
        let host = host_of(url_or_domain)?;

        if let Some(config) = self.lookup(&host) {
            return Some(config);
        }

        if let Some(bare) = host.strip_prefix("www.") {
            if let Some(config) = self.lookup(bare) {
                return Some(config);
            }
        }

        // study.up.ac.za → up.ac.za, stopping at two labels
        let labels: Vec<&str> = host.split('.').collect();
        for start in 1..labels.len().saturating_sub(1) {
            let suffix = labels[start..].join(".");
            if let Some(config) = self.lookup(&suffix) {
                return Some(config);
            }
        }

        None
    }

    fn lookup(&self, domain: &str) -> Option<&ReferenceInstitutionConfig> {
        self.by_domain.get(domain).map(|&idx| &self.configs[idx])
    }

    pub fn configs(&self) -> &[ReferenceInstitutionConfig] {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
