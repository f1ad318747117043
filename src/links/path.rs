/// Normalizes a requested page path
///
/// The only normalization applied is a guaranteed leading `/`. Trailing slashes
/// are significant: `/about` and `/about/` are distinct pages.
///
/// # Examples
///
/// ```
/// use flowsite::links::normalize_page_path;
///
/// assert_eq!(normalize_page_path(""), "/");
/// assert_eq!(normalize_page_path("about"), "/about");
/// assert_eq!(normalize_page_path("/about/"), "/about/");
/// ```
pub fn normalize_page_path(raw: &str) -> String {
    if raw.starts_with('/') {
        raw.to_string()
    } else {
        format!("/{}", raw)
    }
}

/// Returns the path with a leading and a trailing `/`
pub(crate) fn as_directory(path: &str) -> String {
    let mut dir = normalize_page_path(path);
    if !dir.ends_with('/') {
        dir.push('/');
    }
    dir
}
