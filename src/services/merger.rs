// src/services/merger.rs

//! Reconciles a heuristic result set into an authoritative one.

use crate::models::{
    Campus, Course, ExtractorConfig, Faculty, MatchedConfig, ScanResults, key,
};
use crate::services::NameValidator;
use crate::services::hierarchy::{ACADEMIC_PROGRAMMES, HierarchyBuilder};

/// Backfills the secondary (authoritative) set with what only the primary found.
///
/// Campuses are taken as they are, without their faculties. Faculties and
/// courses must re-validate at the merge threshold, which is stricter than the
/// extraction threshold. Nothing already present in the secondary set is
/// touched.
pub struct ResultMerger {
    validator: NameValidator,
    settings: ExtractorConfig,
}

impl ResultMerger {
    pub fn new(validator: NameValidator, settings: ExtractorConfig) -> Self {
        Self {
            validator,
            settings,
        }
    }

    pub fn merge(&self, primary: &ScanResults, secondary: ScanResults) -> ScanResults {
        let website_url = secondary.website_url.clone();
        let threshold = self.validator.settings().merge_threshold;
        let mut seen = secondary.name_sets();

        let new_campuses: Vec<Campus> = primary
            .campuses
            .iter()
            .filter(|c| seen.campuses.insert(key(&c.name)))
            .map(|c| Campus {
                faculties: Vec::new(),
                ..c.clone()
            })
            .collect();

        let mut new_faculties = Vec::new();
        for faculty in primary.faculties() {
            if seen.faculties.contains(&key(&faculty.name)) {
                continue;
            }
            let result = self
                .validator
                .validate_faculty(&faculty.name, Some(&website_url));
            if !result.passes(threshold) {
                log::debug!(
                    "Not backfilling faculty '{}' ({:.2})",
                    faculty.name,
                    result.confidence
                );
                continue;
            }
            let name = result.resolved_name(&faculty.name);
            if !seen.faculties.insert(key(&name)) {
                continue;
            }
            let code = match &result.matched_config {
                Some(MatchedConfig::Faculty(f)) => f.slug.clone(),
                _ => faculty.code.clone(),
            };
            new_faculties.push(Faculty {
                name,
                code,
                description: faculty.description.clone(),
                confidence: result.confidence,
                source_url: faculty.source_url.clone(),
                courses: Vec::new(),
            });
        }

        let mut new_courses = Vec::new();
        for course in primary.courses() {
            let course_key = key(&course.name);
            if seen.courses.contains(&course_key) {
                continue;
            }
            let result = self.validator.validate_course(&course.name);
            if !result.passes(threshold) {
                log::debug!(
                    "Not backfilling course '{}' ({:.2})",
                    course.name,
                    result.confidence
                );
                continue;
            }
            seen.courses.insert(course_key);
            new_courses.push(Course {
                confidence: result.confidence,
                ..course.clone()
            });
        }

        log::info!(
            "Merge added {} campuses, {} faculties, {} courses",
            new_campuses.len(),
            new_faculties.len(),
            new_courses.len()
        );

        let ScanResults {
            institution_name,
            campuses,
            scanned_at,
            page_count,
            ..
        } = secondary;

        let mut campuses: Vec<Campus> = campuses.into_iter().chain(new_campuses).collect();
        if campuses.is_empty() && (!new_faculties.is_empty() || !new_courses.is_empty()) {
            let reference = self.validator.registry().resolve(&website_url);
            campuses.push(
                HierarchyBuilder::new(&self.settings, reference).synthesize_campus(&website_url),
            );
        }

        if !campuses.is_empty() {
            let main = campuses.remove(0);
            let main = self.attach(main, new_faculties, new_courses, &website_url);
            campuses.insert(0, main);
        }

        ScanResults {
            institution_name,
            website_url,
            campuses,
            scanned_at,
            page_count,
        }
    }

    /// Append faculties to the main campus and courses to its first faculty.
    fn attach(
        &self,
        main: Campus,
        new_faculties: Vec<Faculty>,
        new_courses: Vec<Course>,
        website_url: &str,
    ) -> Campus {
        let mut faculties: Vec<Faculty> = main.faculties.into_iter().chain(new_faculties).collect();

        if !new_courses.is_empty() {
            if faculties.is_empty() {
                let builder = HierarchyBuilder::new(&self.settings, None);
                faculties.push(builder.synthesize_faculty(ACADEMIC_PROGRAMMES, new_courses, website_url));
            } else {
                let first = faculties.remove(0);
                faculties.insert(
                    0,
                    Faculty {
                        courses: first.courses.into_iter().chain(new_courses).collect(),
                        ..first
                    },
                );
            }
        }

        Campus { faculties, ..main }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::ValidationConfig;
    use crate::services::registry::tests::test_registry;

    const UP: &str = "https://www.up.ac.za";

    fn merger() -> ResultMerger {
        ResultMerger::new(
            NameValidator::new(Arc::new(test_registry()), ValidationConfig::default()),
            ExtractorConfig::default(),
        )
    }

    fn course(name: &str, confidence: f64) -> Course {
        Course {
            name: name.into(),
            code: crate::utils::slugify(name),
            description: None,
            duration_years: None,
            confidence,
            source_url: UP.into(),
        }
    }

    fn faculty(name: &str, courses: Vec<Course>) -> Faculty {
        Faculty {
            name: name.into(),
            code: crate::utils::slugify(name),
            description: None,
            confidence: 0.7,
            source_url: UP.into(),
            courses,
        }
    }

    fn campus(name: &str, faculties: Vec<Faculty>) -> Campus {
        Campus {
            name: name.into(),
            code: crate::utils::slugify(name),
            location: None,
            confidence: 0.7,
            source_url: UP.into(),
            faculties,
        }
    }

    fn results(campuses: Vec<Campus>) -> ScanResults {
        let mut r = ScanResults::new("University of Pretoria", UP);
        r.campuses = campuses;
        r
    }

    /// Heuristic pass: extra campus, one strong and one weak faculty, courses.
    fn heuristic() -> ScanResults {
        results(vec![
            campus(
                "Hatfield Campus",
                vec![
                    faculty(
                        "Law Faculty",
                        vec![course("Bachelor of Laws", 0.85), course("Commercial Law", 0.5)],
                    ),
                    faculty("School of Wonderful Things", vec![]),
                ],
            ),
            campus("Mamelodi Campus", vec![faculty("Faculty of Health Sciences", vec![])]),
        ])
    }

    /// LLM pass: one campus, one faculty with one course.
    fn llm() -> ScanResults {
        let mut r = results(vec![campus(
            "Hatfield Campus",
            vec![faculty(
                "Faculty of Engineering, Built Environment and Information Technology",
                vec![course("BEng Civil Engineering", 0.85)],
            )],
        )]);
        r.page_count = 7;
        r
    }

    #[test]
    fn test_merge_backfills_with_stricter_bar() {
        let merged = merger().merge(&heuristic(), llm());

        assert_eq!(merged.page_count, 7);
        let campus_names: Vec<&str> = merged.campuses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(campus_names, vec!["Hatfield Campus", "Mamelodi Campus"]);
        assert!(merged.campuses[1].faculties.is_empty());

        let main = &merged.campuses[0];
        let faculty_names: Vec<&str> = main.faculties.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            faculty_names,
            vec![
                "Faculty of Engineering, Built Environment and Information Technology",
                "Faculty of Law",
                "Faculty of Health Sciences",
            ]
        );
        assert_eq!(main.faculties[1].code, "law");
        assert_eq!(main.faculties[1].confidence, 0.95);

        // Weak course stays out, strong one goes under the first faculty
        let courses: Vec<&str> = main.faculties[0].courses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(courses, vec!["BEng Civil Engineering", "Bachelor of Laws"]);
        assert_eq!(merged.course_count(), 2);
    }

    #[test]
    fn test_merge_is_idempotent_over_name_sets() {
        let m = merger();
        let once = m.merge(&heuristic(), llm());
        let twice = m.merge(&once, llm());
        assert_eq!(once.name_sets(), twice.name_sets());
    }

    #[test]
    fn test_merge_never_duplicates_faculties() {
        let merged = merger().merge(&heuristic(), llm());
        let names = merged.name_sets();
        assert_eq!(names.faculties.len(), merged.faculty_count());
    }

    #[test]
    fn test_courses_without_faculty_get_catch_all() {
        let secondary = results(vec![campus("Hatfield Campus", vec![])]);
        let primary = results(vec![campus(
            "Hatfield Campus",
            vec![faculty("Faculties", vec![course("Bachelor of Science", 0.85)])],
        )]);

        let merged = merger().merge(&primary, secondary);
        let faculties = &merged.campuses[0].faculties;
        assert_eq!(faculties.len(), 1);
        assert_eq!(faculties[0].name, ACADEMIC_PROGRAMMES);
        assert_eq!(faculties[0].courses[0].name, "Bachelor of Science");
    }

    #[test]
    fn test_merge_with_empty_primary_is_identity() {
        let merged = merger().merge(&results(vec![]), llm());
        assert_eq!(merged, llm_with_same_timestamp(&merged));
    }

    fn llm_with_same_timestamp(merged: &ScanResults) -> ScanResults {
        let mut expected = llm();
        expected.scanned_at = merged.scanned_at;
        expected
    }
}
