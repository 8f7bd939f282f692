// src/models/results.rs

//! Extracted academic hierarchy: campuses → faculties → courses.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::normalize_whitespace;

/// Final output of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    pub institution_name: String,
    pub website_url: String,
    pub campuses: Vec<Campus>,
    pub scanned_at: DateTime<Utc>,
    /// Number of pages the scan consumed, filled in by the caller
    #[serde(default)]
    pub page_count: usize,
}

impl ScanResults {
    pub fn new(institution_name: impl Into<String>, website_url: impl Into<String>) -> Self {
        Self {
            institution_name: institution_name.into(),
            website_url: website_url.into(),
            campuses: Vec::new(),
            scanned_at: Utc::now(),
            page_count: 0,
        }
    }

    /// Load results from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn faculties(&self) -> impl Iterator<Item = &Faculty> {
        self.campuses.iter().flat_map(|c| &c.faculties)
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.faculties().flat_map(|f| &f.courses)
    }

    pub fn faculty_count(&self) -> usize {
        self.faculties().count()
    }

    pub fn course_count(&self) -> usize {
        self.courses().count()
    }

    /// Lowercased names of every entity, grouped by kind.
    pub fn name_sets(&self) -> NameSets {
        NameSets {
            campuses: self.campuses.iter().map(|c| key(&c.name)).collect(),
            faculties: self.faculties().map(|f| key(&f.name)).collect(),
            courses: self.courses().map(|c| key(&c.name)).collect(),
        }
    }
}

/// Lowercased entity names, used for presence checks and set comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSets {
    pub campuses: HashSet<String>,
    pub faculties: HashSet<String>,
    pub courses: HashSet<String>,
}

/// Normalized lookup key for an entity name: lowercased, whitespace collapsed.
pub fn key(name: &str) -> String {
    normalize_whitespace(name).to_lowercase()
}

/// A physical campus of the institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub confidence: f64,
    pub source_url: String,
    #[serde(default)]
    pub faculties: Vec<Faculty>,
}

/// An academic division hosted on a campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub confidence: f64,
    pub source_url: String,
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// A qualification offered by a faculty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_years: Option<f64>,
    pub confidence: f64,
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScanResults {
        let mut results = ScanResults::new("Test University", "https://test.ac.za");
        results.campuses.push(Campus {
            name: "Main Campus".into(),
            code: "main-campus".into(),
            location: None,
            confidence: 0.6,
            source_url: "https://test.ac.za".into(),
            faculties: vec![Faculty {
                name: "Faculty of Science".into(),
                code: "faculty-of-science".into(),
                description: None,
                confidence: 0.7,
                source_url: "https://test.ac.za".into(),
                courses: vec![Course {
                    name: "Bachelor of Science".into(),
                    code: "bachelor-of-science".into(),
                    description: None,
                    duration_years: Some(3.0),
                    confidence: 0.85,
                    source_url: "https://test.ac.za".into(),
                }],
            }],
        });
        results
    }

    #[test]
    fn test_counts() {
        let results = sample();
        assert_eq!(results.faculty_count(), 1);
        assert_eq!(results.course_count(), 1);
    }

    #[test]
    fn test_name_sets_are_lowercased() {
        let sets = sample().name_sets();
        assert!(sets.faculties.contains("faculty of science"));
        assert!(sets.courses.contains("bachelor of science"));
        assert!(sets.campuses.contains("main campus"));
    }

    #[test]
    fn test_key_collapses_whitespace() {
        assert_eq!(key("Faculty  of\tLaw"), "faculty of law");
        assert_eq!(key("  FACULTY OF\nLAW "), "faculty of law");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("institutionName").is_some());
        assert!(json.get("scannedAt").is_some());
        assert_eq!(
            json["campuses"][0]["faculties"][0]["courses"][0]["durationYears"],
            3.0
        );
    }
}
