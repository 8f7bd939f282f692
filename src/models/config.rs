//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Confidence thresholds and name length bounds
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Page selection and hierarchy assembly settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Language model endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP fetch behavior for `--fetch` scans
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let v = &self.validation;
        for (name, value) in [
            ("validation.primary_threshold", v.primary_threshold),
            ("validation.merge_threshold", v.merge_threshold),
            ("extractor.synthetic_confidence", self.extractor.synthetic_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::validation(format!("{name} must be within [0, 1]")));
            }
        }
        if v.merge_threshold < v.primary_threshold {
            return Err(AppError::validation(
                "validation.merge_threshold must not be below primary_threshold",
            ));
        }
        for (name, bounds) in [
            ("faculty", v.faculty_length),
            ("campus", v.campus_length),
            ("course", v.course_length),
        ] {
            if bounds.min == 0 || bounds.min > bounds.max {
                return Err(AppError::validation(format!(
                    "validation.{name}_length must satisfy 0 < min <= max"
                )));
            }
        }
        if self.extractor.max_pages == 0 {
            return Err(AppError::validation("extractor.max_pages must be > 0"));
        }
        if self.extractor.fallback_campus_name.trim().is_empty() {
            return Err(AppError::validation("extractor.fallback_campus_name is empty"));
        }
        if self.llm.enabled && self.llm.model.trim().is_empty() {
            return Err(AppError::validation("llm.model is empty"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.max_concurrent == 0 {
            return Err(AppError::validation("fetcher.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

/// Inclusive character-length bounds for a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// Name validation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum confidence for a candidate to enter the extracted tree
    #[serde(default = "defaults::primary_threshold")]
    pub primary_threshold: f64,

    /// Minimum confidence for a secondary-set item to be backfilled on merge
    #[serde(default = "defaults::merge_threshold")]
    pub merge_threshold: f64,

    #[serde(default = "defaults::faculty_length")]
    pub faculty_length: LengthBounds,

    #[serde(default = "defaults::campus_length")]
    pub campus_length: LengthBounds,

    #[serde(default = "defaults::course_length")]
    pub course_length: LengthBounds,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            primary_threshold: defaults::primary_threshold(),
            merge_threshold: defaults::merge_threshold(),
            faculty_length: defaults::faculty_length(),
            campus_length: defaults::campus_length(),
            course_length: defaults::course_length(),
        }
    }
}

/// Page selection and assembly settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum pages summarized into the prompt
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Pages of other types qualify when they carry more relevant links than this
    #[serde(default = "defaults::min_link_count")]
    pub min_link_count: usize,

    /// Confidence given to synthesized campuses and catch-all faculties
    #[serde(default = "defaults::synthetic_confidence")]
    pub synthetic_confidence: f64,

    /// Campus name used when nothing better is known
    #[serde(default = "defaults::fallback_campus_name")]
    pub fallback_campus_name: String,

    /// Body text kept per page summary, in graphemes
    #[serde(default = "defaults::body_excerpt_chars")]
    pub body_excerpt_chars: usize,

    #[serde(default = "defaults::max_links_per_page")]
    pub max_links_per_page: usize,

    #[serde(default = "defaults::max_headings_per_page")]
    pub max_headings_per_page: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::max_pages(),
            min_link_count: defaults::min_link_count(),
            synthetic_confidence: defaults::synthetic_confidence(),
            fallback_campus_name: defaults::fallback_campus_name(),
            body_excerpt_chars: defaults::body_excerpt_chars(),
            max_links_per_page: defaults::max_links_per_page(),
            max_headings_per_page: defaults::max_headings_per_page(),
        }
    }
}

/// OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "defaults::llm_enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::llm_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::llm_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "defaults::llm_temperature")]
    pub temperature: f32,

    #[serde(default = "defaults::llm_max_tokens")]
    pub max_tokens: u32,

    /// Transport-level timeout of the HTTP client
    #[serde(default = "defaults::llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::llm_enabled(),
            endpoint: defaults::llm_endpoint(),
            model: defaults::llm_model(),
            api_key_env: defaults::llm_api_key_env(),
            temperature: defaults::llm_temperature(),
            max_tokens: defaults::llm_max_tokens(),
            timeout_secs: defaults::llm_timeout(),
        }
    }
}

/// HTTP client and retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Retries per URL after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base delay between retries, doubled per attempt
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

mod defaults {
    use super::LengthBounds;

    // Validation defaults
    pub fn primary_threshold() -> f64 {
        0.5
    }
    pub fn merge_threshold() -> f64 {
        0.7
    }
    pub fn faculty_length() -> LengthBounds {
        LengthBounds { min: 10, max: 150 }
    }
    pub fn campus_length() -> LengthBounds {
        LengthBounds { min: 5, max: 100 }
    }
    pub fn course_length() -> LengthBounds {
        LengthBounds { min: 5, max: 250 }
    }

    // Extractor defaults
    pub fn max_pages() -> usize {
        12
    }
    pub fn min_link_count() -> usize {
        5
    }
    pub fn synthetic_confidence() -> f64 {
        0.6
    }
    pub fn fallback_campus_name() -> String {
        "Main Campus".into()
    }
    pub fn body_excerpt_chars() -> usize {
        1500
    }
    pub fn max_links_per_page() -> usize {
        60
    }
    pub fn max_headings_per_page() -> usize {
        30
    }

    // LLM defaults
    pub fn llm_enabled() -> bool {
        true
    }
    pub fn llm_endpoint() -> String {
        "https://api.openai.com/v1/chat/completions".into()
    }
    pub fn llm_model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn llm_api_key_env() -> String {
        "OPENAI_API_KEY".into()
    }
    pub fn llm_temperature() -> f32 {
        0.1
    }
    pub fn llm_max_tokens() -> u32 {
        4096
    }
    pub fn llm_timeout() -> u64 {
        120
    }

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; uniscan/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn max_retries() -> u32 {
        2
    }
    pub fn retry_backoff() -> u64 {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.validation.merge_threshold = 0.4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_length_bounds() {
        let mut config = Config::default();
        config.validation.campus_length = LengthBounds { min: 50, max: 10 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.fetcher.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [validation]
            merge_threshold = 0.8

            [extractor]
            fallback_campus_name = "Central Campus"
            "#,
        )
        .unwrap();

        assert_eq!(config.validation.merge_threshold, 0.8);
        assert_eq!(config.validation.primary_threshold, 0.5);
        assert_eq!(config.validation.faculty_length, LengthBounds { min: 10, max: 150 });
        assert_eq!(config.extractor.fallback_campus_name, "Central Campus");
        assert_eq!(config.extractor.max_pages, 12);
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let config = Config::load_or_default("/nonexistent/uniscan.toml");
        assert_eq!(config.extractor.synthetic_confidence, 0.6);
    }
}
