// src/services/hierarchy.rs

//! Candidate acceptance and campus → faculty → course assembly.
//!
//! Shared by every extraction strategy so the output invariants hold no matter
//! where candidates came from:
//! - at least one campus exists,
//! - every course sits under exactly one faculty,
//! - no faculty appears twice in the tree.

use crate::models::{
    Campus, Course, EntityKind, ExtractedCandidate, ExtractorConfig, Faculty, MatchedConfig,
    NameSets, ReferenceInstitutionConfig, ScanResults, key,
};
use crate::services::NameValidator;
use crate::services::validator::{contains_either, strip_division_prefix};
use crate::utils::slugify;

/// Catch-all faculty when several real faculties exist.
pub const OTHER_PROGRAMMES: &str = "Other Programmes";

/// Catch-all faculty when no faculty was found at all.
pub const ACADEMIC_PROGRAMMES: &str = "Academic Programmes";

/// A validated course and the faculty its source associated it with.
#[derive(Debug, Clone)]
pub struct PlacedCourse {
    pub course: Course,
    pub faculty_hint: Option<String>,
}

/// Validated, deduplicated entities waiting for assembly.
#[derive(Debug, Default)]
pub struct CandidateSet {
    campuses: Vec<Campus>,
    faculties: Vec<Faculty>,
    courses: Vec<PlacedCourse>,
    seen: NameSets,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a candidate and keep it when it clears `threshold`.
    ///
    /// The canonical spelling replaces the candidate name when the reference
    /// data knows it. Returns whether the candidate was kept.
    pub fn accept(
        &mut self,
        validator: &NameValidator,
        candidate: ExtractedCandidate,
        website_url: &str,
        threshold: f64,
    ) -> bool {
        let result = validator.validate(&candidate, website_url);
        if !result.passes(threshold) {
            log::debug!(
                "Rejected {:?} '{}' ({:.2}): {}",
                candidate.kind,
                candidate.name,
                result.confidence,
                result.reason.as_deref().unwrap_or("below threshold")
            );
            return false;
        }

        let name = result.resolved_name(&candidate.name);
        let seen = match candidate.kind {
            EntityKind::Campus => &mut self.seen.campuses,
            EntityKind::Faculty => &mut self.seen.faculties,
            EntityKind::Course => &mut self.seen.courses,
        };
        if !seen.insert(key(&name)) {
            return false;
        }

        let source_url = if candidate.source_url.is_empty() {
            website_url.to_string()
        } else {
            candidate.source_url
        };

        match candidate.kind {
            EntityKind::Campus => {
                let location = candidate.suggested_location.or(match &result.matched_config {
                    Some(MatchedConfig::Campus(c)) => c.location.clone(),
                    _ => None,
                });
                self.campuses.push(Campus {
                    code: slugify(&name),
                    name,
                    location,
                    confidence: result.confidence,
                    source_url,
                    faculties: Vec::new(),
                });
            }
            EntityKind::Faculty => {
                let (code, description) = match &result.matched_config {
                    Some(MatchedConfig::Faculty(f)) => (
                        f.slug.clone(),
                        candidate.description.or_else(|| f.description.clone()),
                    ),
                    _ => (slugify(&name), candidate.description),
                };
                self.faculties.push(Faculty {
                    name,
                    code,
                    description,
                    confidence: result.confidence,
                    source_url,
                    courses: Vec::new(),
                });
            }
            EntityKind::Course => {
                self.courses.push(PlacedCourse {
                    course: Course {
                        code: slugify(&name),
                        name,
                        description: candidate.description,
                        duration_years: candidate.duration_years,
                        confidence: result.confidence,
                        source_url,
                    },
                    faculty_hint: candidate.suggested_faculty,
                });
            }
        }
        true
    }

    pub fn campus_count(&self) -> usize {
        self.campuses.len()
    }

    pub fn faculty_count(&self) -> usize {
        self.faculties.len()
    }

    pub fn course_count(&self) -> usize {
        self.courses.len()
    }
}

/// Assembles a [`CandidateSet`] into a campus tree.
pub struct HierarchyBuilder<'a> {
    settings: &'a ExtractorConfig,
    reference: Option<&'a ReferenceInstitutionConfig>,
}

impl<'a> HierarchyBuilder<'a> {
    pub fn new(
        settings: &'a ExtractorConfig,
        reference: Option<&'a ReferenceInstitutionConfig>,
    ) -> Self {
        Self {
            settings,
            reference,
        }
    }

    /// Build the final results; `page_count` is left for the caller.
    pub fn build(
        &self,
        set: CandidateSet,
        institution_name: &str,
        website_url: &str,
    ) -> ScanResults {
        let CandidateSet {
            campuses,
            faculties,
            courses,
            ..
        } = set;

        let faculties = self.place_courses(faculties, courses, website_url);

        let mut campuses = if campuses.is_empty() {
            vec![self.synthesize_campus(website_url)]
        } else {
            campuses
        };

        // All faculties hang off the first campus
        let first = campuses.remove(0);
        let first = Campus {
            faculties: first.faculties.into_iter().chain(faculties).collect(),
            ..first
        };
        campuses.insert(0, first);

        let mut results = ScanResults::new(institution_name, website_url);
        results.campuses = campuses;
        results
    }

    fn place_courses(
        &self,
        faculties: Vec<Faculty>,
        courses: Vec<PlacedCourse>,
        website_url: &str,
    ) -> Vec<Faculty> {
        let faculty_keys: Vec<String> = faculties
            .iter()
            .map(|f| strip_division_prefix(&key(&f.name)).to_string())
            .collect();

        let mut buckets: Vec<Vec<Course>> = vec![Vec::new(); faculties.len()];
        let mut unassigned = Vec::new();

        for placed in courses {
            let slot = placed.faculty_hint.as_deref().and_then(|hint| {
                let hint = key(hint);
                let hint = strip_division_prefix(&hint);
                faculty_keys.iter().position(|f| contains_either(hint, f))
            });
            match slot {
                Some(idx) => buckets[idx].push(placed.course),
                None => unassigned.push(placed.course),
            }
        }

        let mut faculties: Vec<Faculty> = faculties
            .into_iter()
            .zip(buckets)
            .map(|(faculty, courses)| Faculty {
                courses: faculty.courses.into_iter().chain(courses).collect(),
                ..faculty
            })
            .collect();

        if unassigned.is_empty() {
            return faculties;
        }

        match faculties.len() {
            0 => faculties.push(self.synthesize_faculty(ACADEMIC_PROGRAMMES, unassigned, website_url)),
            1 => {
                let only = faculties.remove(0);
                faculties.push(Faculty {
                    courses: only.courses.into_iter().chain(unassigned).collect(),
                    ..only
                });
            }
            _ => faculties.push(self.synthesize_faculty(OTHER_PROGRAMMES, unassigned, website_url)),
        }
        faculties
    }

    /// The campus used when none survived validation.
    pub fn synthesize_campus(&self, website_url: &str) -> Campus {
        let main = self.reference.and_then(|r| r.main_campus());
        let name = main
            .map(|c| c.name.clone())
            .unwrap_or_else(|| self.settings.fallback_campus_name.clone());

        Campus {
            code: slugify(&name),
            name,
            location: main.and_then(|c| c.location.clone()),
            confidence: self.settings.synthetic_confidence,
            source_url: website_url.to_string(),
            faculties: Vec::new(),
        }
    }

    /// A catch-all faculty holding `courses`.
    pub fn synthesize_faculty(&self, name: &str, courses: Vec<Course>, website_url: &str) -> Faculty {
        Faculty {
            name: name.to_string(),
            code: slugify(name),
            description: None,
            confidence: self.settings.synthetic_confidence,
            source_url: website_url.to_string(),
            courses,
        }
    }
}
