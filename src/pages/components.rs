//! Website component projection
//!
//! Flow documents are loosely-typed JSON. This module projects the website
//! input components out of `data.nodes[]` into [`WebsiteComponentConfig`]
//! values, and edits the stored page arrays of the document in place.
//!
//! Node shape:
//!
//! ```json
//! {
//!   "id": "WebsiteInput-abc12",
//!   "data": {
//!     "type": "WebsiteInput",
//!     "node": { "template": {
//!       "use_store":    { "value": true },
//!       "require_link": { "value": true },
//!       "page_store":   { "value": [ { "path": "/", "content": "..." } ] }
//!     } }
//!   }
//! }
//! ```

use crate::config::FeatureFlags;
use crate::pages::store::{PageEntry, PageStore};
use serde_json::{json, Map, Value};

/// Component type marking a website input node
pub const WEBSITE_INPUT_TYPE: &str = "WebsiteInput";

/// Store and gating settings of one website input component
#[derive(Debug, Clone, PartialEq)]
pub struct WebsiteComponentConfig {
    /// Node id, used as the key for per-request overrides
    pub id: String,
    pub use_store: bool,
    pub require_link: bool,
    pub page_store: PageStore,
}

impl WebsiteComponentConfig {
    /// True when this component restricts generation to linked pages
    ///
    /// `require_link` has no effect without a store to derive links from.
    pub fn is_gated(&self) -> bool {
        self.use_store && self.require_link
    }

    /// Applies process-wide switches to the component settings
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        if !features.page_store {
            self.use_store = false;
        }
        self
    }
}

/// Returns every website input component in a flow document, in node order
pub fn website_components(data: &Value) -> Vec<WebsiteComponentConfig> {
    nodes(data).filter_map(project).collect()
}

/// Stores `content` under `path` in the page store of `component_id`
///
/// The stored array is edited in place: the first object whose `path` matches
/// gets its `content` replaced, otherwise a `{path, content}` object is
/// appended. Every other element and field is left as it was, including
/// entries the typed projection skips.
///
/// Returns `None` when the component does not exist or its store is not an
/// array, otherwise whether the document changed.
pub fn upsert_stored_page(
    data: &mut Value,
    component_id: &str,
    path: &str,
    content: &str,
) -> Option<bool> {
    let entries = stored_entries_mut(data, component_id)?;
    let position = entries
        .iter()
        .position(|entry| entry.get("path").and_then(Value::as_str) == Some(path));

    match position {
        Some(index) => {
            let entry = &mut entries[index];
            if entry.get("content").and_then(Value::as_str) == Some(content) {
                return Some(false);
            }
            entry["content"] = Value::String(content.to_string());
        }
        None => entries.push(json!({ "path": path, "content": content })),
    }
    Some(true)
}

/// Removes every stored object with `path` from the page store of `component_id`
///
/// Returns `None` when the component has no editable store, otherwise whether
/// anything was removed.
pub fn remove_stored_page(data: &mut Value, component_id: &str, path: &str) -> Option<bool> {
    let entries = stored_entries_mut(data, component_id)?;
    let before = entries.len();
    entries.retain(|entry| entry.get("path").and_then(Value::as_str) != Some(path));
    Some(entries.len() != before)
}

/// Raw `page_store.value` array of a website component, created if absent
fn stored_entries_mut<'a>(data: &'a mut Value, component_id: &str) -> Option<&'a mut Vec<Value>> {
    let template = data
        .get_mut("nodes")?
        .as_array_mut()?
        .iter_mut()
        .filter(|node| is_website_input(node))
        .find(|node| node.get("id").and_then(Value::as_str) == Some(component_id))?
        .pointer_mut("/data/node/template")?
        .as_object_mut()?;

    let field = template
        .entry("page_store")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()?;

    let value = field.entry("value").or_insert(Value::Null);
    if value.is_null() {
        *value = Value::Array(Vec::new());
    }
    value.as_array_mut()
}

fn nodes(data: &Value) -> impl Iterator<Item = &Value> {
    data.get("nodes")
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter())
        .into_iter()
        .flatten()
}

fn is_website_input(node: &Value) -> bool {
    node.pointer("/data/type").and_then(Value::as_str) == Some(WEBSITE_INPUT_TYPE)
}

fn project(node: &Value) -> Option<WebsiteComponentConfig> {
    if !is_website_input(node) {
        return None;
    }

    let Some(id) = node.get("id").and_then(Value::as_str) else {
        tracing::warn!("Skipping website input component without an id");
        return None;
    };

    let template = node.pointer("/data/node/template");

    Some(WebsiteComponentConfig {
        id: id.to_string(),
        use_store: bool_field(template, "use_store"),
        require_link: bool_field(template, "require_link"),
        page_store: store_field(id, template),
    })
}

fn field_value<'a>(template: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    template?.get(name)?.get("value")
}

fn bool_field(template: Option<&Value>, name: &str) -> bool {
    field_value(template, name)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn store_field(component_id: &str, template: Option<&Value>) -> PageStore {
    let Some(entries) = field_value(template, "page_store").and_then(Value::as_array) else {
        return PageStore::new();
    };

    let entries = entries
        .iter()
        .filter_map(|raw| match serde_json::from_value::<PageEntry>(raw.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    "Skipping malformed page store entry in component {}: {}",
                    component_id,
                    e
                );
                None
            }
        })
        .collect();

    PageStore::from_entries(entries)
}
