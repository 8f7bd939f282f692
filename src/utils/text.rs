// src/utils/text.rs

//! Text normalization helpers.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` graphemes of `s`.
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    s.graphemes(true).take(max).collect()
}

/// Build a lowercase, hyphen-separated code from a display name.
///
/// # Examples
/// ```
/// use uniscan::utils::slugify;
///
/// assert_eq!(slugify("Faculty of Engineering, Built Environment & IT"), "faculty-of-engineering-built-environment-it");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  Faculty \n of\tLaw  "), "Faculty of Law");
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("héllo wörld", 5), "héllo");
        assert_eq!(truncate_graphemes("abc", 10), "abc");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bachelor of Science (BSc)"), "bachelor-of-science-bsc");
        assert_eq!(slugify("  --Main Campus--  "), "main-campus");
        assert_eq!(slugify(""), "");
    }
}
