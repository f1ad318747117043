//! Internal link extraction from generated pages
//!
//! Only anchors count: a page "links" to another page when it contains an
//! `<a href="...">` that resolves to a path on the same site.

use crate::links::path::as_directory;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Synthetic origin used to resolve site-relative links
///
/// Generated pages never know the host they are served from, so every page
/// path is resolved against this placeholder and only the path is kept.
const SITE_ORIGIN: &str = "http://site.invalid/";

/// Extracts the set of same-site paths linked from an HTML page
///
/// # Rules
///
/// - Only `<a href="...">` elements are considered
/// - `href` values starting with `http://` or `https://` are external and skipped
/// - Every other `href` is resolved against `base_path`, which is treated as a
///   directory (a trailing `/` is added when missing) so that `post1` on page
///   `/blog` resolves to `/blog/post1`
/// - Resolutions that leave the site (`//cdn.example/x`, `mailto:`, `javascript:`)
///   are dropped; query strings and fragments are discarded
///
/// Malformed markup never fails: the parser recovers and whatever anchors it
/// finds are returned.
///
/// # Example
///
/// ```
/// use flowsite::links::extract_internal_links;
///
/// let links = extract_internal_links(r#"<a href="post1">Post</a>"#, "/blog/");
/// assert!(links.contains("/blog/post1"));
/// ```
pub fn extract_internal_links(html: &str, base_path: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    let Some(base) = resolve_base(base_path) else {
        tracing::debug!("Unusable base path for link extraction: {}", base_path);
        return links;
    };

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return links;
    };

    let document = Html::parse_document(html);
    for element in document.select(&anchor_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(path) = resolve_internal(href, &base) {
                links.insert(path);
            }
        }
    }

    links
}

/// Builds the absolute base URL for a page path
fn resolve_base(base_path: &str) -> Option<Url> {
    let origin = Url::parse(SITE_ORIGIN).ok()?;
    origin.join(&as_directory(base_path)).ok()
}

/// Resolves one href; returns its path when it stays on the site
fn resolve_internal(href: &str, base: &Url) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return None;
    }

    let resolved = base.join(href).ok()?;
    if resolved.origin() != base.origin() {
        return None;
    }

    Some(resolved.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(html: &str, base: &str) -> Vec<String> {
        extract_internal_links(html, base).into_iter().collect()
    }

    #[test]
    fn test_extract_absolute_path_link() {
        let html = r#"<html><body><a href="/about">About</a></body></html>"#;
        assert_eq!(links(html, "/"), vec!["/about"]);
    }

    #[test]
    fn test_relative_link_resolves_against_directory() {
        let html = r#"<a href="post1">Post</a>"#;
        assert_eq!(links(html, "/blog/"), vec!["/blog/post1"]);
    }

    #[test]
    fn test_base_without_trailing_slash_is_treated_as_directory() {
        let html = r#"<a href="post1">Post</a>"#;
        assert_eq!(links(html, "/blog"), vec!["/blog/post1"]);
    }

    #[test]
    fn test_parent_directory_link() {
        let html = r#"<a href="../contact">Contact</a>"#;
        assert_eq!(links(html, "/blog/post1"), vec!["/blog/contact"]);
    }

    #[test]
    fn test_skip_external_links() {
        let html = r#"
            <a href="https://example.com/x">Secure</a>
            <a href="http://example.com/y">Plain</a>
        "#;
        assert!(links(html, "/").is_empty());
    }

    #[test]
    fn test_skip_protocol_relative_and_special_schemes() {
        let html = r#"
            <a href="//cdn.example.com/lib.js">CDN</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">Noop</a>
        "#;
        assert!(links(html, "/").is_empty());
    }

    #[test]
    fn test_query_and_fragment_are_discarded() {
        let html = r##"<a href="/search?q=rust#results">Search</a>"##;
        assert_eq!(links(html, "/"), vec!["/search"]);
    }

    #[test]
    fn test_fragment_only_link_points_at_page_itself() {
        let html = r##"<a href="#top">Top</a>"##;
        assert_eq!(links(html, "/docs"), vec!["/docs/"]);
    }

    #[test]
    fn test_anchor_without_href_is_ignored() {
        let html = r#"<a name="anchor">Anchor</a><link href="/style.css" rel="stylesheet">"#;
        assert!(links(html, "/").is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"<a href="/a">1</a><a href="a">2</a><a href="/a">3</a>"#;
        assert_eq!(links(html, "/"), vec!["/a"]);
    }

    #[test]
    fn test_malformed_html_degrades_gracefully() {
        let html = r#"<div><a href="/ok">ok<p><a href="/also-ok"</div></span>>"#;
        let found = extract_internal_links(html, "/");
        assert!(found.contains("/ok"));
    }

    #[test]
    fn test_plain_text_has_no_links() {
        assert!(links("hello", "/x").is_empty());
    }
}
