// src/models/page.rs

//! Scraped page input and candidate/validation types.

use serde::{Deserialize, Serialize};

use crate::models::{CampusConfig, FacultyConfig};

/// Classification assigned to a page by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Home,
    Faculty,
    Course,
    Programme,
    Campus,
    About,
    Contact,
    News,
    #[serde(other)]
    Other,
}

impl PageType {
    /// Guess a page type from its URL and title.
    pub fn infer(url: &str, title: &str) -> Self {
        let haystack = format!("{} {}", url.to_lowercase(), title.to_lowercase());
        let path = url::Url::parse(url)
            .map(|u| u.path().trim_matches('/').to_string())
            .unwrap_or_default();

        if path.is_empty() {
            return Self::Home;
        }
        if ["faculty", "faculties", "school", "college"]
            .iter()
            .any(|k| haystack.contains(k))
        {
            return Self::Faculty;
        }
        if ["programme", "program", "qualification"]
            .iter()
            .any(|k| haystack.contains(k))
        {
            return Self::Programme;
        }
        if ["course", "degree", "study", "studies"]
            .iter()
            .any(|k| haystack.contains(k))
        {
            return Self::Course;
        }
        if haystack.contains("campus") {
            return Self::Campus;
        }
        if haystack.contains("contact") {
            return Self::Contact;
        }
        if haystack.contains("news") || haystack.contains("event") {
            return Self::News;
        }
        if haystack.contains("about") {
            return Self::About;
        }
        Self::Other
    }

    /// Whether the page type is one extraction always looks at.
    pub fn is_academic(&self) -> bool {
        matches!(
            self,
            Self::Home | Self::Faculty | Self::Course | Self::Programme | Self::Campus
        )
    }
}

/// A page produced by the external crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedPage {
    pub url: String,

    /// Raw HTML or already-extracted text
    #[serde(alias = "content", alias = "text")]
    pub html: String,

    #[serde(default)]
    pub title: String,

    #[serde(default = "default_page_type")]
    pub page_type: PageType,
}

fn default_page_type() -> PageType {
    PageType::Other
}

/// Kind of entity a candidate name claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Faculty,
    Campus,
    Course,
}

/// A raw name proposed by an extraction strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCandidate {
    pub name: String,
    pub kind: EntityKind,
    /// Faculty the strategy associated a course with
    pub suggested_faculty: Option<String>,
    /// Location the strategy associated a campus with
    pub suggested_location: Option<String>,
    pub description: Option<String>,
    pub duration_years: Option<f64>,
    pub source_url: String,
}

impl ExtractedCandidate {
    pub fn new(name: impl Into<String>, kind: EntityKind, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            suggested_faculty: None,
            suggested_location: None,
            description: None,
            duration_years: None,
            source_url: source_url.into(),
        }
    }
}

/// Reference entry a validated name resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchedConfig {
    Faculty(FacultyConfig),
    Campus(CampusConfig),
}

/// Outcome of validating one candidate name.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub confidence: f64,
    pub reason: Option<String>,
    /// Canonical spelling to substitute for the candidate
    pub corrected_value: Option<String>,
    pub matched_config: Option<MatchedConfig>,
}

impl ValidationResult {
    pub fn valid(confidence: f64) -> Self {
        Self {
            is_valid: true,
            confidence,
            reason: None,
            corrected_value: None,
            matched_config: None,
        }
    }

    pub fn invalid(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            confidence,
            reason: Some(reason.into()),
            corrected_value: None,
            matched_config: None,
        }
    }

    /// Accepted as a canonical reference entry.
    pub fn matched(confidence: f64, matched: MatchedConfig) -> Self {
        let canonical = match &matched {
            MatchedConfig::Faculty(f) => f.name.clone(),
            MatchedConfig::Campus(c) => c.name.clone(),
        };
        Self {
            is_valid: true,
            confidence,
            reason: None,
            corrected_value: Some(canonical),
            matched_config: Some(matched),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Valid and at or above `threshold`.
    pub fn passes(&self, threshold: f64) -> bool {
        self.is_valid && self.confidence >= threshold
    }

    /// The name to keep: canonical spelling when one was found.
    pub fn resolved_name(&self, candidate: &str) -> String {
        self.corrected_value
            .clone()
            .unwrap_or_else(|| candidate.trim().to_string())
    }
}
