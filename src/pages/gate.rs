//! Reachability gate
//!
//! When link gating is on, a path may only be generated if it is the root or
//! is linked from a page that is already in the store. The reachable set is
//! rebuilt from a store snapshot on every check, so it depends only on the
//! snapshot's contents and order.

use crate::links::extract_internal_links;
use crate::pages::components::WebsiteComponentConfig;
use crate::pages::store::PageEntry;
use std::collections::BTreeSet;

/// Path that is always reachable
pub const ROOT_PATH: &str = "/";

/// Computes every path reachable from the root through stored pages
///
/// The set is seeded with `/` and grows by the internal links of each entry,
/// resolved against that entry's own path.
pub fn reachable_paths<'a>(entries: impl IntoIterator<Item = &'a PageEntry>) -> BTreeSet<String> {
    let mut reachable = BTreeSet::from([ROOT_PATH.to_string()]);
    for entry in entries {
        reachable.extend(extract_internal_links(&entry.content, &entry.path));
    }
    reachable
}

/// Decides whether `requested_path` may be served or generated
///
/// Always allowed when `require_link` is false. Otherwise the path must be
/// reachable from the root or already be stored.
pub fn is_allowed(requested_path: &str, snapshot: &[PageEntry], require_link: bool) -> bool {
    if !require_link || requested_path == ROOT_PATH {
        return true;
    }
    if snapshot.iter().any(|entry| entry.path == requested_path) {
        return true;
    }
    reachable_paths(snapshot).contains(requested_path)
}

/// Gate over every store-enabled component of a flow
///
/// Gating applies when any store-enabled component requires links; the
/// reachable set is then the union over all store-enabled components.
#[derive(Debug, Clone)]
pub struct ReachabilityGate {
    require_link: bool,
    stored: BTreeSet<String>,
    reachable: BTreeSet<String>,
}

impl ReachabilityGate {
    pub fn from_components(components: &[WebsiteComponentConfig]) -> Self {
        let require_link = components.iter().any(WebsiteComponentConfig::is_gated);
        let stores = components.iter().filter(|c| c.use_store);

        let mut stored = BTreeSet::new();
        let mut reachable = BTreeSet::from([ROOT_PATH.to_string()]);
        if require_link {
            for component in stores {
                let entries = component.page_store.enumerate();
                stored.extend(entries.iter().map(|entry| entry.path.clone()));
                reachable.extend(reachable_paths(entries));
            }
        }

        Self {
            require_link,
            stored,
            reachable,
        }
    }

    pub fn requires_link(&self) -> bool {
        self.require_link
    }

    pub fn allows(&self, path: &str) -> bool {
        !self.require_link || self.reachable.contains(path) || self.stored.contains(path)
    }

    /// Reachable paths, for diagnostics
    pub fn reachable(&self) -> &BTreeSet<String> {
        &self.reachable
    }
}
