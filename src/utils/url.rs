// src/utils/url.rs

//! URL and hostname helpers.

/// Extract the lowercased hostname from a URL or bare domain.
///
/// Input containing a scheme separator is parsed as a URL; anything else is
/// treated as a hostname, with any trailing path, query or port dropped.
///
/// # Examples
/// ```
/// use uniscan::utils::url::host_of;
///
/// assert_eq!(host_of("https://Study.UP.ac.za/apply"), Some("study.up.ac.za".to_string()));
/// assert_eq!(host_of("wits.ac.za"), Some("wits.ac.za".to_string()));
/// ```
pub fn host_of(url_or_domain: &str) -> Option<String> {
    let input = url_or_domain.trim();
    if input.contains("://") {
        let parsed = ::url::Url::parse(input).ok()?;
        return parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .map(|h| h.to_lowercase());
    }

    let host = input.split(['/', '?', '#']).next().unwrap_or(input);
    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };
    let host = host.trim_end_matches('.');

    if host.is_empty() || host.contains(char::is_whitespace) {
        return None;
    }
    Some(host.to_lowercase())
}

/// Resolve a potentially relative URL against a base URL string.
///
/// Falls back to `href` unchanged when the base cannot be parsed.
pub fn resolve(base_url: &str, href: &str) -> String {
    ::url::Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Add `www.` if absent, strip it if present.
pub fn toggle_www(host: &str) -> String {
    match host.strip_prefix("www.") {
        Some(bare) => bare.to_string(),
        None => format!("www.{host}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of_url() {
        assert_eq!(
            host_of("https://Example.AC.ZA/path?q=1"),
            Some("example.ac.za".to_string())
        );
        assert_eq!(
            host_of("http://www.wits.ac.za:8080/"),
            Some("www.wits.ac.za".to_string())
        );
    }

    #[test]
    fn test_host_of_bare_domain() {
        assert_eq!(host_of("UP.ac.za"), Some("up.ac.za".to_string()));
        assert_eq!(host_of("up.ac.za/apply"), Some("up.ac.za".to_string()));
        assert_eq!(host_of("up.ac.za:443"), Some("up.ac.za".to_string()));
    }

    #[test]
    fn test_host_of_malformed() {
        assert_eq!(host_of(""), None);
        assert_eq!(host_of("   "), None);
        assert_eq!(host_of("https://"), None);
        assert_eq!(host_of("not a domain"), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve("https://www.up.ac.za/faculties/", "law"),
            "https://www.up.ac.za/faculties/law"
        );
        assert_eq!(
            resolve("https://www.up.ac.za/faculties/", "/apply"),
            "https://www.up.ac.za/apply"
        );
        assert_eq!(resolve("not a base", "/apply"), "/apply");
    }

    #[test]
    fn test_toggle_www() {
        assert_eq!(toggle_www("www.wits.ac.za"), "wits.ac.za");
        assert_eq!(toggle_www("wits.ac.za"), "www.wits.ac.za");
    }
}
