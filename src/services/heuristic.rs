// src/services/heuristic.rs

//! Non-LLM extraction from headings and link texts.
//!
//! Used as the primary pass of a scan and as the fallback when the language
//! model is unavailable. Never fails: at worst it yields only the synthesized
//! campus.

use scraper::Html;

use crate::models::{
    EntityKind, ExtractedCandidate, ExtractorConfig, ScanResults, ScrapedPage,
};
use crate::services::NameValidator;
use crate::services::hierarchy::{CandidateSet, HierarchyBuilder};
use crate::services::summary::select_texts;
use crate::utils::host_of;

/// Separators between a page name and the site name in `<title>`.
const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", ": "];

/// Longest heading or link text considered as a name.
const MAX_NAME_CHARS: usize = 250;

/// Extracts a hierarchy by routing page texts through the validator.
pub struct HeuristicExtractor {
    validator: NameValidator,
    settings: ExtractorConfig,
}

impl HeuristicExtractor {
    pub fn new(validator: NameValidator, settings: ExtractorConfig) -> Self {
        Self {
            validator,
            settings,
        }
    }

    pub fn extract(&self, pages: &[ScrapedPage], website_url: &str) -> ScanResults {
        let reference = self.validator.registry().resolve(website_url);
        let threshold = self.validator.settings().primary_threshold;

        let mut set = CandidateSet::new();
        for page in pages {
            for candidate in self.page_candidates(page, website_url) {
                set.accept(&self.validator, candidate, website_url, threshold);
            }
        }

        log::info!(
            "Heuristic pass found {} campuses, {} faculties, {} courses in {} pages",
            set.campus_count(),
            set.faculty_count(),
            set.course_count(),
            pages.len()
        );

        let institution_name = reference
            .map(|r| r.name.clone())
            .or_else(|| host_of(website_url))
            .unwrap_or_else(|| website_url.to_string());

        HierarchyBuilder::new(&self.settings, reference).build(set, &institution_name, website_url)
    }

    /// Candidates proposed by one page, in document order.
    fn page_candidates(&self, page: &ScrapedPage, website_url: &str) -> Vec<ExtractedCandidate> {
        let document = Html::parse_document(&page.html);
        let headings = select_texts(&document, "h1, h2, h3");
        let link_texts = select_texts(&document, "a");

        let page_faculty = self.page_faculty(page, &document, website_url);

        let mut candidates = Vec::new();
        if let Some(faculty) = &page_faculty {
            candidates.push(ExtractedCandidate::new(
                faculty.clone(),
                EntityKind::Faculty,
                page.url.clone(),
            ));
        }

        for text in headings.iter().chain(&link_texts) {
            if text.chars().count() > MAX_NAME_CHARS {
                continue;
            }
            let Some(kind) = route(text) else {
                continue;
            };
            let mut candidate = ExtractedCandidate::new(text.clone(), kind, page.url.clone());
            if kind == EntityKind::Course {
                candidate.suggested_faculty = page_faculty.clone();
            }
            candidates.push(candidate);
        }
        candidates
    }

    /// The faculty a page is about, from its title or first `h1`.
    fn page_faculty(&self, page: &ScrapedPage, document: &Html, website_url: &str) -> Option<String> {
        let threshold = self.validator.settings().primary_threshold;
        let title = title_segment(&page.title);
        let h1 = select_texts(document, "h1").into_iter().next();

        [Some(title.to_string()), h1]
            .into_iter()
            .flatten()
            .filter(|name| !name.is_empty())
            .find_map(|name: String| {
                let result = self.validator.validate_faculty(&name, Some(website_url));
                result
                    .passes(threshold)
                    .then(|| result.resolved_name(&name))
            })
    }
}

/// Decide which validator a text should go through, if any.
fn route(text: &str) -> Option<EntityKind> {
    if NameValidator::has_degree_indicator(text) {
        Some(EntityKind::Course)
    } else if NameValidator::has_campus_word(text) {
        Some(EntityKind::Campus)
    } else if NameValidator::has_structural_word(text) {
        Some(EntityKind::Faculty)
    } else {
        None
    }
}

/// The leading part of a page title, before any site-name suffix.
fn title_segment(title: &str) -> &str {
    let title = title.trim();
    TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .map_or(title, |idx| title[..idx].trim())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{PageType, ValidationConfig};
    use crate::services::hierarchy::OTHER_PROGRAMMES;
    use crate::services::registry::tests::test_registry;

    const UP: &str = "https://www.up.ac.za";
    const UNKNOWN: &str = "https://www.example.edu";

    fn extractor() -> HeuristicExtractor {
        HeuristicExtractor::new(
            NameValidator::new(Arc::new(test_registry()), ValidationConfig::default()),
            ExtractorConfig::default(),
        )
    }

    fn page(url: &str, title: &str, html: &str) -> ScrapedPage {
        ScrapedPage {
            url: url.to_string(),
            html: html.to_string(),
            title: title.to_string(),
            page_type: PageType::infer(url, title),
        }
    }

    #[test]
    fn test_title_segment() {
        assert_eq!(title_segment("Faculty of Law | University of Pretoria"), "Faculty of Law");
        assert_eq!(title_segment("Home - UP: Welcome"), "Home");
        assert_eq!(title_segment("  Plain title "), "Plain title");
    }

    #[test]
    fn test_route() {
        assert_eq!(route("Bachelor of Commerce"), Some(EntityKind::Course));
        assert_eq!(route("Mamelodi Campus"), Some(EntityKind::Campus));
        assert_eq!(route("School of Education"), Some(EntityKind::Faculty));
        assert_eq!(route("Latest news"), None);
    }

    #[test]
    fn test_courses_attach_to_page_faculty() {
        let pages = vec![
            page(
                &format!("{UP}/faculties"),
                "Faculties | University of Pretoria",
                r#"<h1>Faculties</h1>
                   <a href="/law">Faculty of Law</a>
                   <a href="/ebit">EBIT Faculty home</a>
                   <a href="/apply">Apply Now</a>"#,
            ),
            page(
                &format!("{UP}/law"),
                "Faculty of Law | University of Pretoria",
                r#"<h1>Welcome</h1>
                   <h2>Our programmes</h2>
                   <a href="/llb">Bachelor of Laws</a>
                   <a href="/more">Read More</a>"#,
            ),
            page(
                &format!("{UP}/campuses"),
                "Campuses",
                r#"<a href="/hatfield">Hatfield Campus</a>
                   <a href="/online">Virtual Campus</a>"#,
            ),
        ];

        let results = extractor().extract(&pages, UP);

        assert_eq!(results.institution_name, "University of Pretoria");
        assert_eq!(results.campuses.len(), 1);
        assert_eq!(results.campuses[0].name, "Hatfield Campus");

        let faculties = &results.campuses[0].faculties;
        assert_eq!(faculties.len(), 1);
        assert_eq!(faculties[0].name, "Faculty of Law");
        assert_eq!(faculties[0].courses[0].name, "Bachelor of Laws");
        assert_eq!(faculties[0].courses[0].source_url, format!("{UP}/law"));
    }

    #[test]
    fn test_unassigned_courses_with_several_faculties() {
        let pages = vec![page(
            UNKNOWN,
            "Example University",
            r#"<a>Faculty of Health Sciences</a>
               <a>School of Engineering</a>
               <a>Diploma in Tourism Management</a>"#,
        )];

        let results = extractor().extract(&pages, UNKNOWN);

        assert_eq!(results.institution_name, "www.example.edu");
        assert_eq!(results.campuses[0].name, "Main Campus");
        let faculties = &results.campuses[0].faculties;
        assert_eq!(faculties.len(), 3);
        assert_eq!(faculties[2].name, OTHER_PROGRAMMES);
    }

    #[test]
    fn test_no_pages_still_yields_campus() {
        let results = extractor().extract(&[], UNKNOWN);
        assert_eq!(results.campuses.len(), 1);
        assert_eq!(results.faculty_count(), 0);
    }
}
