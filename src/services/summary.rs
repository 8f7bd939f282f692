// src/services/summary.rs

//! Page reduction: turns raw pages into compact summaries for the prompt.

use std::collections::HashSet;

use scraper::{Html, Selector};
use serde::Serialize;

use crate::models::{ExtractorConfig, PageType, ScrapedPage};
use crate::utils::{normalize_whitespace, resolve, truncate_graphemes};

/// Terms marking a link or snippet as academically relevant.
const ACADEMIC_TERMS: &[&str] = &[
    "faculty",
    "faculties",
    "school",
    "college",
    "department",
    "programme",
    "program",
    "course",
    "qualification",
    "degree",
    "study",
    "campus",
    "bachelor",
    "diploma",
    "certificate",
    "master",
    "doctor",
    "honours",
    "undergraduate",
    "postgraduate",
];

const MAX_SECTIONS: usize = 20;
const MAX_SECTION_CHARS: usize = 200;

/// Whether `text` mentions any academic term.
pub fn is_academic_text(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ACADEMIC_TERMS.iter().any(|t| lowered.contains(t))
}

/// A link kept for the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSummary {
    pub text: String,
    pub href: String,
}

/// Compact, prompt-ready view of one page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub page_type: PageType,
    pub headings: Vec<String>,
    pub sections: Vec<String>,
    pub links: Vec<LinkSummary>,
    pub body_excerpt: String,
}

impl PageSummary {
    /// Reduce a scraped page according to the extractor limits.
    pub fn from_page(page: &ScrapedPage, settings: &ExtractorConfig) -> Self {
        let document = Html::parse_document(&page.html);

        let headings = select_texts(&document, "h1, h2, h3")
            .into_iter()
            .take(settings.max_headings_per_page)
            .collect();

        let sections = select_texts(&document, "p, li")
            .into_iter()
            .filter(|t| is_academic_text(t))
            .take(MAX_SECTIONS)
            .map(|t| truncate_graphemes(&t, MAX_SECTION_CHARS))
            .collect();

        let links = relevant_links(&document, &page.url, settings.max_links_per_page);
        let body_excerpt = truncate_graphemes(&visible_text(&document), settings.body_excerpt_chars);

        Self {
            url: page.url.clone(),
            title: normalize_whitespace(&page.title),
            page_type: page.page_type,
            headings,
            sections,
            links,
            body_excerpt,
        }
    }

    /// Ordering weight: academic page types first, then link-rich pages.
    fn relevance(&self) -> (u8, usize) {
        let weight = match self.page_type {
            PageType::Faculty | PageType::Programme | PageType::Course => 3,
            PageType::Campus => 2,
            PageType::Home => 1,
            _ => 0,
        };
        (weight, self.links.len())
    }
}

/// Keep academic pages and link-rich pages, most relevant first, capped.
///
/// Ties keep their input order.
pub fn select_relevant(summaries: Vec<PageSummary>, settings: &ExtractorConfig) -> Vec<PageSummary> {
    let mut kept: Vec<PageSummary> = summaries
        .into_iter()
        .filter(|s| s.page_type.is_academic() || s.links.len() > settings.min_link_count)
        .collect();
    kept.sort_by(|a, b| b.relevance().cmp(&a.relevance()));
    kept.truncate(settings.max_pages);
    kept
}

/// Whitespace-normalized, non-empty, deduplicated texts of the matched elements.
pub fn select_texts(document: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        log::error!("Invalid built-in selector: {css}");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty() && seen.insert(t.to_lowercase()))
        .collect()
}

/// Anchor texts and absolute hrefs whose text or target is academically relevant.
pub fn relevant_links(document: &Html, base_url: &str, limit: usize) -> Vec<LinkSummary> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
                return None;
            }
            let text = normalize_whitespace(&el.text().collect::<String>());
            if !is_academic_text(&text) && !is_academic_text(href) {
                return None;
            }
            Some(LinkSummary {
                text,
                href: resolve(base_url, href),
            })
        })
        .filter(|link| seen.insert(link.href.clone()))
        .take(limit)
        .collect()
}

/// Text content outside script/style elements.
fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"));
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    normalize_whitespace(&out)
}
