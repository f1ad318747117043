//! Page path handling
//!
//! This module provides request path normalization and extraction of
//! same-site links from generated HTML.

mod extract;
mod path;

pub use extract::extract_internal_links;
pub use path::normalize_page_path;
