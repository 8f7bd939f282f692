// src/models/reference.rs

//! Curated per-institution reference data.
//!
//! One [`ReferenceInstitutionConfig`] per known institution. Records are loaded
//! once at startup and never mutated afterwards.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Institution category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstitutionType {
    Traditional,
    Comprehensive,
    UniversityOfTechnology,
    Private,
}

/// Ground-truth record for a single institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceInstitutionConfig {
    /// Full institution name (e.g., "University of Pretoria")
    pub name: String,

    /// Short name or acronym (e.g., "UP")
    pub short_name: String,

    #[serde(rename = "type")]
    pub kind: InstitutionType,

    /// Domains owned by the institution, without scheme
    pub domains: Vec<String>,

    #[serde(default)]
    pub faculties: Vec<FacultyConfig>,

    #[serde(default)]
    pub campuses: Vec<CampusConfig>,

    /// Matching hints for the external crawler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraping_config: Option<serde_json::Value>,

    /// Scan targets and limits for the external crawler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<serde_json::Value>,
}

impl ReferenceInstitutionConfig {
    /// The campus flagged as main, falling back to the first listed campus.
    pub fn main_campus(&self) -> Option<&CampusConfig> {
        self.campuses
            .iter()
            .find(|c| c.is_main)
            .or_else(|| self.campuses.first())
    }

    /// Check that the record is usable for matching.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("institution with empty name"));
        }
        if self.domains.iter().all(|d| d.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "{} has no domains",
                self.name
            )));
        }
        if let Some(f) = self.faculties.iter().find(|f| f.name.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "{} has a faculty with an empty name (slug '{}')",
                self.name, f.slug
            )));
        }
        if self.campuses.iter().any(|c| c.name.trim().is_empty()) {
            return Err(AppError::validation(format!(
                "{} has a campus with an empty name",
                self.name
            )));
        }
        Ok(())
    }
}

/// A known faculty of an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyConfig {
    /// Canonical name
    pub name: String,

    pub slug: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A known campus of an institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampusConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub is_main: bool,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Faculties hosted at this campus (advisory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculties: Option<Vec<String>>,
}

/// Load all reference records from a JSON file.
pub fn load_reference_configs(path: impl AsRef<Path>) -> Result<Vec<ReferenceInstitutionConfig>> {
    let content = fs::read_to_string(path)?;
    let configs: Vec<ReferenceInstitutionConfig> = serde_json::from_str(&content)?;
    for config in &configs {
        config.validate()?;
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "name": "University of Pretoria",
            "shortName": "UP",
            "type": "traditional",
            "domains": ["up.ac.za"],
            "faculties": [
                { "name": "Faculty of Law", "slug": "law", "aliases": ["Law Faculty"] }
            ],
            "campuses": [
                { "name": "Hatfield Campus", "isMain": true, "aliases": ["Hatfield"] },
                { "name": "Onderstepoort Campus", "aliases": [] }
            ],
            "scrapingConfig": { "selectors": { "faculty": "nav a" } }
        }
    ]"#;

    #[test]
    fn test_deserialize_camel_case() {
        let configs: Vec<ReferenceInstitutionConfig> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].short_name, "UP");
        assert_eq!(configs[0].kind, InstitutionType::Traditional);
        assert!(configs[0].scraping_config.is_some());
        assert!(configs[0].targets.is_none());
    }

    #[test]
    fn test_main_campus() {
        let configs: Vec<ReferenceInstitutionConfig> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(configs[0].main_campus().unwrap().name, "Hatfield Campus");
    }

    #[test]
    fn test_university_of_technology_type() {
        let kind: InstitutionType = serde_json::from_str("\"university-of-technology\"").unwrap();
        assert_eq!(kind, InstitutionType::UniversityOfTechnology);
    }

    #[test]
    fn test_validate_rejects_missing_domains() {
        let mut configs: Vec<ReferenceInstitutionConfig> = serde_json::from_str(SAMPLE).unwrap();
        configs[0].domains.clear();
        assert!(configs[0].validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("institutions.json");
        fs::write(&path, SAMPLE).unwrap();

        let configs = load_reference_configs(&path).unwrap();
        assert_eq!(configs[0].faculties[0].aliases, vec!["Law Faculty".to_string()]);
    }
}
