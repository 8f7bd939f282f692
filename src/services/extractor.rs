// src/services/extractor.rs

//! Language-model extraction of the campus/faculty/course hierarchy.
//!
//! The model only proposes names. Every proposal goes through the
//! [`NameValidator`] and the shared [`HierarchyBuilder`] before it reaches the
//! output, so a hallucinated "Apply Now" faculty never survives.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::models::{
    EntityKind, ExtractedCandidate, ExtractorConfig, ReferenceInstitutionConfig, ScanResults,
    ScrapedPage,
};
use crate::services::hierarchy::{CandidateSet, HierarchyBuilder};
use crate::services::llm::{CompletionOptions, LlmProvider, extract_json_object};
use crate::services::summary::{PageSummary, select_relevant};
use crate::services::NameValidator;
use crate::utils::host_of;

const SYSTEM_PROMPT: &str = "\
You extract the academic structure of a university from summaries of its web pages.
Respond with a single JSON object and nothing else, using this shape:
{
  \"institutionName\": string,
  \"campuses\": [{\"name\": string, \"location\": string|null, \"sourceUrl\": string|null}],
  \"faculties\": [{\"name\": string, \"description\": string|null, \"sourceUrl\": string|null}],
  \"courses\": [{\"name\": string, \"faculty\": string|null, \"durationYears\": number|null,
                \"description\": string|null, \"sourceUrl\": string|null}]
}
Rules:
- Only list names that appear in the pages. Do not invent entities.
- Faculties are academic divisions (faculty, school, college), not menu items or page titles.
- Courses are qualifications a student can enrol for, with their full name.
- For each course, set \"faculty\" to the faculty that offers it when the pages say so.
- Campuses are physical sites. Skip online or virtual campuses.
- Use empty arrays when nothing of a kind is found.";

const GENERIC_PATTERNS: &str = "\
No reference data is available for this institution. Typical shapes:
- Faculties: \"Faculty of <discipline>\", \"School of <discipline>\", \"College of <discipline>\"
- Courses: start with a qualification, e.g. \"Bachelor of Science\", \"BCom Accounting\", \
\"Diploma in Nursing\", \"LLB\", \"MBChB\", \"Master of Arts\"
- Campuses: usually \"<place> Campus\"";

/// Turns scraped pages into a validated [`ScanResults`] using a language model.
pub struct LlmExtractor {
    validator: NameValidator,
    provider: Option<Arc<dyn LlmProvider>>,
    settings: ExtractorConfig,
    options: CompletionOptions,
}

impl LlmExtractor {
    pub fn new(
        validator: NameValidator,
        provider: Option<Arc<dyn LlmProvider>>,
        settings: ExtractorConfig,
        options: CompletionOptions,
    ) -> Self {
        Self {
            validator,
            provider,
            settings,
            options,
        }
    }

    /// Whether a completion backend is configured.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Extract without an external cancellation signal.
    pub async fn extract(&self, pages: &[ScrapedPage], website_url: &str) -> Option<ScanResults> {
        self.extract_until(pages, website_url, std::future::pending::<()>())
            .await
    }

    /// Extract, abandoning the completion as soon as `cancel` resolves.
    ///
    /// Returns `None` when no page is relevant (the provider is not called),
    /// when no provider is configured, on provider failure or cancellation,
    /// and when the reply holds no parseable JSON object.
    pub async fn extract_until<C>(
        &self,
        pages: &[ScrapedPage],
        website_url: &str,
        cancel: C,
    ) -> Option<ScanResults>
    where
        C: Future<Output = ()>,
    {
        let reference = self.validator.registry().resolve(website_url);

        let summaries: Vec<PageSummary> = pages
            .iter()
            .map(|page| PageSummary::from_page(page, &self.settings))
            .collect();
        let summaries = select_relevant(summaries, &self.settings);
        if summaries.is_empty() {
            log::info!("No relevant pages among {} for {website_url}", pages.len());
            return None;
        }

        let Some(provider) = &self.provider else {
            log::warn!("No LLM provider configured, skipping LLM extraction");
            return None;
        };

        let user_prompt = match build_user_prompt(website_url, reference, &summaries) {
            Ok(prompt) => prompt,
            Err(e) => {
                log::warn!("Failed to build prompt for {website_url}: {e}");
                return None;
            }
        };

        log::info!(
            "Requesting LLM extraction for {website_url} over {} pages",
            summaries.len()
        );

        let reply = tokio::select! {
            reply = provider.complete(SYSTEM_PROMPT, &user_prompt, &self.options) => reply,
            _ = cancel => {
                log::info!("LLM extraction cancelled for {website_url}");
                return None;
            }
        };

        let raw = match reply {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("LLM completion failed for {website_url}: {e}");
                return None;
            }
        };

        let Some(response) = parse_reply(&raw) else {
            log::warn!("Unparseable LLM reply for {website_url}");
            return None;
        };

        Some(self.assemble(response, reference, website_url))
    }

    fn assemble(
        &self,
        response: LlmReply,
        reference: Option<&ReferenceInstitutionConfig>,
        website_url: &str,
    ) -> ScanResults {
        let institution_name = reference
            .map(|r| r.name.clone())
            .or_else(|| {
                response
                    .institution_name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
            })
            .or_else(|| host_of(website_url))
            .unwrap_or_else(|| website_url.to_string());

        let threshold = self.validator.settings().primary_threshold;
        let mut set = CandidateSet::new();
        let mut rejected = 0usize;
        for candidate in response.into_candidates() {
            if !set.accept(&self.validator, candidate, website_url, threshold) {
                rejected += 1;
            }
        }

        log::info!(
            "LLM extraction kept {} campuses, {} faculties, {} courses ({rejected} dropped)",
            set.campus_count(),
            set.faculty_count(),
            set.course_count()
        );

        HierarchyBuilder::new(&self.settings, reference).build(set, &institution_name, website_url)
    }
}

fn build_user_prompt(
    website_url: &str,
    reference: Option<&ReferenceInstitutionConfig>,
    summaries: &[PageSummary],
) -> serde_json::Result<String> {
    let mut prompt = format!("Website: {website_url}\n\n");

    match reference {
        Some(config) => {
            prompt.push_str(&format!(
                "Known structure of {}. Reuse these exact names whenever the pages refer to them.\n",
                config.name
            ));
            if !config.faculties.is_empty() {
                prompt.push_str("Faculties:\n");
                for faculty in &config.faculties {
                    prompt.push_str(&format!("- {}\n", faculty.name));
                }
            }
            if !config.campuses.is_empty() {
                prompt.push_str("Campuses:\n");
                for campus in &config.campuses {
                    prompt.push_str(&format!("- {}\n", campus.name));
                }
            }
        }
        None => prompt.push_str(GENERIC_PATTERNS),
    }

    prompt.push_str("\n\nPages:\n");
    prompt.push_str(&serde_json::to_string_pretty(summaries)?);
    Ok(prompt)
}

fn parse_reply(raw: &str) -> Option<LlmReply> {
    let json = extract_json_object(raw)?;
    match serde_json::from_str(json) {
        Ok(reply) => Some(reply),
        Err(e) => {
            log::debug!("LLM reply is not valid JSON: {e}");
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmReply {
    institution_name: Option<String>,
    campuses: Vec<LlmCampus>,
    faculties: Vec<LlmFaculty>,
    courses: Vec<LlmCourse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmCampus {
    name: Option<String>,
    location: Option<String>,
    source_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmFaculty {
    name: Option<String>,
    description: Option<String>,
    source_url: Option<String>,
    /// Some models nest courses under their faculty
    courses: Vec<LlmCourse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LlmCourse {
    name: Option<String>,
    faculty: Option<String>,
    #[serde(deserialize_with = "lenient_years")]
    duration_years: Option<f64>,
    description: Option<String>,
    source_url: Option<String>,
}

/// Accept `3`, `3.5`, `"3"` and `"3 years"`.
fn lenient_years<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s
            .split_whitespace()
            .next()
            .and_then(|token| token.parse::<f64>().ok()),
        _ => None,
    }
    .filter(|years| years.is_finite() && *years > 0.0))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl LlmCourse {
    fn into_candidate(self, default_faculty: Option<&str>) -> Option<ExtractedCandidate> {
        let name = non_empty(self.name)?;
        let mut candidate =
            ExtractedCandidate::new(name, EntityKind::Course, self.source_url.unwrap_or_default());
        candidate.suggested_faculty =
            non_empty(self.faculty).or_else(|| default_faculty.map(String::from));
        candidate.duration_years = self.duration_years;
        candidate.description = non_empty(self.description);
        Some(candidate)
    }
}

impl LlmReply {
    /// Flatten into candidates: campuses, then faculties, then courses.
    fn into_candidates(self) -> Vec<ExtractedCandidate> {
        let mut campuses = Vec::new();
        let mut faculties = Vec::new();
        let mut courses = Vec::new();

        for campus in self.campuses {
            let Some(name) = non_empty(campus.name) else {
                continue;
            };
            let mut candidate = ExtractedCandidate::new(
                name,
                EntityKind::Campus,
                campus.source_url.unwrap_or_default(),
            );
            candidate.suggested_location = non_empty(campus.location);
            campuses.push(candidate);
        }

        for faculty in self.faculties {
            let Some(name) = non_empty(faculty.name) else {
                continue;
            };
            courses.extend(
                faculty
                    .courses
                    .into_iter()
                    .filter_map(|c| c.into_candidate(Some(&name))),
            );
            let mut candidate = ExtractedCandidate::new(
                name,
                EntityKind::Faculty,
                faculty.source_url.unwrap_or_default(),
            );
            candidate.description = non_empty(faculty.description);
            faculties.push(candidate);
        }

        courses.extend(self.courses.into_iter().filter_map(|c| c.into_candidate(None)));

        campuses.into_iter().chain(faculties).chain(courses).collect()
    }
}
