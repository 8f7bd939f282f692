// src/services/validator.rs

//! Rule-based name validation with confidence scoring.
//!
//! Each entity kind has an ordered rule list evaluated top to bottom; the first
//! rule that decides wins. Overlapping junk patterns depend on that order, so
//! the lists below must not be sorted or deduplicated.
//!
//! | Check                               | Faculty | Campus | Course |
//! |-------------------------------------|---------|--------|--------|
//! | junk pattern                        | 0.0 ✗   | 0.0 ✗  | 0.0 ✗  |
//! | length out of bounds                | 0.1 ✗   | 0.1 ✗  | 0.1 ✗  |
//! | reference exact / alias / partial   | 1.0 / 0.95 / 0.85 | 1.0 / 0.95 / 0.9 | – |
//! | generic fallback                    | 0.2 ✗, 0.3 ✗, 0.7 ✓ | 0.7 ✓, 0.5 ✓ | 0.85 ✓, 0.5 ✓, 0.2 ✗ |

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::models::{
    CampusConfig, EntityKind, ExtractedCandidate, FacultyConfig, LengthBounds, MatchedConfig,
    ReferenceInstitutionConfig, ValidationConfig, ValidationResult, key,
};
use crate::services::ReferenceConfigRegistry;

/// A compiled pattern and the label reported when it rejects a name.
struct Rule {
    pattern: Regex,
    label: &'static str,
}

fn compile(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .filter_map(|&(pattern, label)| match Regex::new(pattern) {
            Ok(pattern) => Some(Rule { pattern, label }),
            Err(e) => {
                log::error!("Skipping invalid rule pattern {pattern:?}: {e}");
                None
            }
        })
        .collect()
}

fn compile_one(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        log::error!("Invalid pattern {pattern:?}: {e}");
        // Fallback pattern that won't match anything
        Regex::new(r"\z.").unwrap()
    })
}

fn first_match<'a>(rules: &'a [Rule], name: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.pattern.is_match(name))
}

const FACULTY_JUNK: &[(&str, &str)] = &[
    (r"^home$", "navigation label"),
    (r"^(apply|apply now|apply online)$", "call to action"),
    (r"^(about|about us|contact|contact us)$", "navigation label"),
    (r"^(faculties|schools|departments|colleges|institutes|centres)$", "generic category"),
    (r"^(our|all|view all|explore our|explore) (faculties|schools|departments|colleges)$", "generic category"),
    (r"^(faculties|schools) (and|&) (schools|departments|institutes)$", "generic category"),
    (r"^(read|learn|find out) more$", "call to action"),
    (r"^(menu|search|login|log in|sign in|close|back)$", "navigation label"),
    (r"^(news|events|news and events|news & events|latest news)$", "navigation label"),
    (r"^(undergraduate|postgraduate)( studies| programmes| programs)?$", "generic category"),
    (r"^faculty of .+ campus$", "faculty/campus composite"),
    (r"^(faculty|school) (home|news|contacts?|staff|events)$", "faculty sub-page label"),
    (r"^(dean'?s? (message|office)|message from the dean)$", "faculty sub-page label"),
    (r"^(research|library|staff|alumni|students?)$", "navigation label"),
];

const CAMPUS_JUNK: &[(&str, &str)] = &[
    (r"^(virtual|online|digital|distance)( learning)?( campus)?$", "virtual campus"),
    (r"^e-?campus$", "virtual campus"),
    (r"\b(virtual|online) campus\b", "virtual campus"),
    (r"^faculty of .+ campus$", "faculty/campus composite"),
    (r"^main$", "bare 'main'"),
    (r"^(home|apply|apply now|contact us|about us)$", "navigation label"),
    (r"^(campuses|our campuses|all campuses|campus life|campus map|campus tours?)$", "generic category"),
];

const COURSE_JUNK: &[(&str, &str)] = &[
    (r"^(apply|apply now|apply online|enrol now|enroll now|register now|enquire|enquire now)$", "call to action"),
    (r"^(read|learn|find out|see|view) more$", "call to action"),
    (r"^\d+$", "bare number"),
    (r"^(view|see|browse) (all )?(courses|programmes|programs|qualifications)$", "call to action"),
    (r"^(courses|programmes|programs|qualifications|undergraduate|postgraduate)$", "generic category"),
    (r"^(download|click here|more info|more information)\b", "call to action"),
    (r"^(home|contact us|about us)$", "navigation label"),
];

static FACULTY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(FACULTY_JUNK));
static CAMPUS_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(CAMPUS_JUNK));
static COURSE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| compile(COURSE_JUNK));

static STRUCTURAL_WORD: LazyLock<Regex> =
    LazyLock::new(|| compile_one(r"\b(faculty|school|college|department|institute|centre)\b"));

static CAMPUS_WORD: LazyLock<Regex> = LazyLock::new(|| compile_one(r"\bcampus\b"));

static DISCIPLINE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    compile_one(concat!(
        r"\b(engineering|scien|arts\b|humanities|law\b|legal|medicine|medical|health|",
        r"business|commerce|economic|management|education|theolog|religio|agricultur|",
        r"veterinary|dentistry|dental|pharmac|nursing|architecture|built environment|",
        r"informatics|computing|computer|information technology|mathemat|statistic|",
        r"physics|chemistry|biolog|psycholog|social|music|design|accounting|financ|",
        r"technolog|languages?\b|literature|journalism|media|communication|philosoph|",
        r"histor|geograph|environment|tourism|hospitality|public administration|",
        r"governance|policy|nutrition|sport)"
    ))
});

static DEGREE_INDICATOR: LazyLock<Regex> = LazyLock::new(|| {
    compile_one(concat!(
        r"^((bachelor|master|doctor|doctoral|doctorate|advanced diploma|diploma|",
        r"higher certificate|certificate|honours|honors|postgraduate (diploma|certificate)|",
        r"national (diploma|certificate))(s|'s|\x{2019}s)?\b|",
        r"(b\.?sc|b\.?a|b\.?com|b\.?eng|b\.?ed|b\.?tech|b\.?pharm|b\.?arch|b\.?soc\.?sc|bds|bvsc|",
        r"llb|llm|mbchb|mba|m\.?sc|m\.?a|m\.?com|m\.?eng|m\.?ed|m\.?tech|m\.?phil|",
        r"ph\.?d|d\.?phil|nd|hnd|pgdip|pgce|adv\.? ?dip)\b)"
    ))
});

/// Division prefixes removed before fuzzy comparisons, first match only.
const DIVISION_PREFIXES: &[&str] = &[
    "faculty of ",
    "school of ",
    "college of ",
    "department of ",
    "institute of ",
    "institute for ",
    "centre for ",
    "centre of ",
];

/// Strip a leading "the" and one "Faculty of"-style prefix from a lowercased name.
pub fn strip_division_prefix(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_prefix("the ").unwrap_or(name);
    DIVISION_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
        .trim()
}

fn strip_campus_suffix(name: &str) -> &str {
    let name = name.trim();
    name.strip_suffix("campus").unwrap_or(name).trim()
}

/// True when either non-empty string contains the other.
pub fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// Validates candidate faculty, campus and course names.
///
/// Pure and total: every call returns a [`ValidationResult`].
#[derive(Clone)]
pub struct NameValidator {
    registry: Arc<ReferenceConfigRegistry>,
    settings: ValidationConfig,
}

impl NameValidator {
    pub fn new(registry: Arc<ReferenceConfigRegistry>, settings: ValidationConfig) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &ValidationConfig {
        &self.settings
    }

    pub fn registry(&self) -> &ReferenceConfigRegistry {
        &self.registry
    }

    /// Dispatch on the candidate's kind.
    pub fn validate(&self, candidate: &ExtractedCandidate, website_url: &str) -> ValidationResult {
        match candidate.kind {
            EntityKind::Faculty => self.validate_faculty(&candidate.name, Some(website_url)),
            EntityKind::Campus => self.validate_campus(&candidate.name, Some(website_url)),
            EntityKind::Course => self.validate_course(&candidate.name),
        }
    }

    pub fn validate_faculty(&self, name: &str, website_url: Option<&str>) -> ValidationResult {
        let normalized = key(name);

        if let Some(rejection) =
            Self::reject_early(&FACULTY_RULES, &normalized, self.settings.faculty_length)
        {
            return rejection;
        }

        if let Some(config) = website_url.and_then(|u| self.registry.resolve(u)) {
            if let Some(result) = Self::match_faculty(config, &normalized) {
                return result;
            }
        }

        if !STRUCTURAL_WORD.is_match(&normalized) {
            return ValidationResult::invalid(0.2, "no structural word (faculty, school, ...)");
        }
        if !DISCIPLINE_KEYWORD.is_match(&normalized) {
            return ValidationResult::invalid(0.3, "no academic discipline keyword");
        }
        ValidationResult::valid(0.7).with_reason("not confirmed against reference data")
    }

    pub fn validate_campus(&self, name: &str, website_url: Option<&str>) -> ValidationResult {
        let normalized = key(name);

        if let Some(rejection) =
            Self::reject_early(&CAMPUS_RULES, &normalized, self.settings.campus_length)
        {
            return rejection;
        }

        if let Some(config) = website_url.and_then(|u| self.registry.resolve(u)) {
            if let Some(result) = Self::match_campus(config, &normalized) {
                return result;
            }
        }

        if CAMPUS_WORD.is_match(&normalized) {
            ValidationResult::valid(0.7)
        } else {
            ValidationResult::valid(0.5).with_reason("might be a bare location name")
        }
    }

    pub fn validate_course(&self, name: &str) -> ValidationResult {
        let normalized = key(name);

        if let Some(rejection) =
            Self::reject_early(&COURSE_RULES, &normalized, self.settings.course_length)
        {
            return rejection;
        }

        if DEGREE_INDICATOR.is_match(&normalized) {
            return ValidationResult::valid(0.85);
        }
        if DISCIPLINE_KEYWORD.is_match(&normalized) {
            return ValidationResult::valid(0.5).with_reason("no degree indicator");
        }
        ValidationResult::invalid(0.2, "no degree indicator or discipline keyword")
    }

    /// Whether a lowercased name starts with a qualification prefix.
    pub fn has_degree_indicator(name: &str) -> bool {
        DEGREE_INDICATOR.is_match(&key(name))
    }

    /// Whether a lowercased name contains a faculty-like structural word.
    pub fn has_structural_word(name: &str) -> bool {
        STRUCTURAL_WORD.is_match(&key(name))
    }

    pub fn has_campus_word(name: &str) -> bool {
        CAMPUS_WORD.is_match(&key(name))
    }

    fn reject_early(
        rules: &[Rule],
        normalized: &str,
        bounds: LengthBounds,
    ) -> Option<ValidationResult> {
        if let Some(rule) = first_match(rules, normalized) {
            return Some(ValidationResult::invalid(
                0.0,
                format!("matches junk pattern ({})", rule.label),
            ));
        }

        let len = normalized.chars().count();
        if !bounds.contains(len) {
            return Some(ValidationResult::invalid(
                0.1,
                format!("length {len} outside [{}, {}]", bounds.min, bounds.max),
            ));
        }
        None
    }

    fn match_faculty(
        config: &ReferenceInstitutionConfig,
        normalized: &str,
    ) -> Option<ValidationResult> {
        let found = |f: &FacultyConfig, confidence| {
            ValidationResult::matched(confidence, MatchedConfig::Faculty(f.clone()))
        };

        if let Some(f) = config.faculties.iter().find(|f| key(&f.name) == normalized) {
            return Some(found(f, 1.0));
        }

        if let Some(f) = config
            .faculties
            .iter()
            .find(|f| f.aliases.iter().any(|a| key(a) == normalized))
        {
            return Some(found(f, 0.95));
        }

        let stripped = strip_division_prefix(normalized);
        config
            .faculties
            .iter()
            .find(|f| contains_either(stripped, strip_division_prefix(&key(&f.name))))
            .map(|f| found(f, 0.85))
    }

    fn match_campus(config: &ReferenceInstitutionConfig, normalized: &str) -> Option<ValidationResult> {
        let found = |c: &CampusConfig, confidence| {
            ValidationResult::matched(confidence, MatchedConfig::Campus(c.clone()))
        };

        if let Some(c) = config.campuses.iter().find(|c| key(&c.name) == normalized) {
            return Some(found(c, 1.0));
        }

        if let Some(c) = config
            .campuses
            .iter()
            .find(|c| c.aliases.iter().any(|a| key(a) == normalized))
        {
            return Some(found(c, 0.95));
        }

        let stripped = strip_campus_suffix(normalized);
        config
            .campuses
            .iter()
            .find(|c| !stripped.is_empty() && strip_campus_suffix(&key(&c.name)) == stripped)
            .map(|c| found(c, 0.9))
    }
}
