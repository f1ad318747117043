//! Page store module
//!
//! This module holds the cached pages of a website component and the logic
//! that decides which paths may be generated:
//! - `PageStore`: ordered `(path, content)` cache with exact-path lookup
//! - `WebsiteComponentConfig`: typed projection of a flow's website inputs
//! - `ReachabilityGate`: link-based allow-list derived from stored pages

mod components;
mod gate;
mod store;

pub use components::{
    remove_stored_page, upsert_stored_page, website_components, WebsiteComponentConfig,
    WEBSITE_INPUT_TYPE,
};
pub use gate::{is_allowed, reachable_paths, ReachabilityGate, ROOT_PATH};
pub use store::{PageEntry, PageStore};
