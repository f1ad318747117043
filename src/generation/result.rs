//! Generation result model
//!
//! A run returns one entry per executed output vertex group, each holding
//! the outputs of its components. Payloads are loosely shaped: a bare string,
//! a `{text_key, data}` record, or a `{text}` message.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result key under which the page-producing component exposes its HTML
pub const HTML_RESULT_KEY: &str = "html";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default)]
    pub outputs: Vec<RunOutputs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutputs {
    #[serde(default)]
    pub outputs: Vec<Option<ResultData>>,
}

/// Output of a single component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultData {
    #[serde(default)]
    pub component_display_name: Option<String>,
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub results: Map<String, Value>,
}

impl ResultData {
    /// Returns the text of the payload stored under `key`
    pub fn payload_text(&self, key: &str) -> Option<String> {
        self.results.get(key).and_then(|payload| payload_text(payload, key))
    }

    fn has_role(&self, display_name: &str) -> bool {
        self.component_display_name.as_deref() == Some(display_name)
    }
}

fn payload_text(payload: &Value, key: &str) -> Option<String> {
    match payload {
        Value::String(text) => Some(text.clone()),
        Value::Object(record) => {
            let data = record.get("data");
            if let Some(text_key) = record.get("text_key").and_then(Value::as_str) {
                if let Some(text) = data.and_then(|d| d.get(text_key)).and_then(Value::as_str) {
                    return Some(text.to_string());
                }
            }
            record
                .get("text")
                .and_then(Value::as_str)
                .or_else(|| data.and_then(|d| d.get(key)).and_then(Value::as_str))
                .map(str::to_string)
        }
        _ => None,
    }
}

/// Extracts the page HTML from a run result
///
/// The last output whose component is named `output_component` decides the
/// page. If that output has no HTML, or empty HTML, there is no page even when
/// an earlier output carried one.
pub fn extract_html(result: &GenerationResult, output_component: &str) -> Option<String> {
    result
        .outputs
        .iter()
        .flat_map(|group| group.outputs.iter().flatten())
        .filter(|output| output.has_role(output_component))
        .last()
        .and_then(|output| output.payload_text(HTML_RESULT_KEY))
        .filter(|html| !html.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: Value) -> GenerationResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extract_from_data_record() {
        let result = result(json!({
            "outputs": [{ "outputs": [{
                "component_display_name": "Website Output",
                "results": { "html": { "text_key": "html", "data": { "html": "<p>hi</p>" } } }
            }] }]
        }));
        assert_eq!(
            extract_html(&result, "Website Output").as_deref(),
            Some("<p>hi</p>")
        );
    }

    #[test]
    fn test_extract_from_plain_string_and_message() {
        let plain = result(json!({ "outputs": [{ "outputs": [{
            "component_display_name": "Website Output",
            "results": { "html": "<p>plain</p>" }
        }] }] }));
        assert_eq!(extract_html(&plain, "Website Output").as_deref(), Some("<p>plain</p>"));

        let message = result(json!({ "outputs": [{ "outputs": [{
            "component_display_name": "Website Output",
            "results": { "html": { "text": "<p>message</p>" } }
        }] }] }));
        assert_eq!(
            extract_html(&message, "Website Output").as_deref(),
            Some("<p>message</p>")
        );
    }

    #[test]
    fn test_other_components_are_ignored() {
        let result = result(json!({ "outputs": [{ "outputs": [
            { "component_display_name": "Chat Output", "results": { "html": "<p>chat</p>" } },
            null
        ] }] }));
        assert!(extract_html(&result, "Website Output").is_none());
    }

    #[test]
    fn test_last_matching_output_wins() {
        let result = result(json!({ "outputs": [
            { "outputs": [{ "component_display_name": "Website Output", "results": { "html": "first" } }] },
            { "outputs": [{ "component_display_name": "Website Output", "results": { "html": "second" } }] }
        ] }));
        assert_eq!(extract_html(&result, "Website Output").as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_html_is_missing() {
        let result = result(json!({ "outputs": [{ "outputs": [{
            "component_display_name": "Website Output",
            "results": { "html": "" }
        }] }] }));
        assert!(extract_html(&result, "Website Output").is_none());
    }

    #[test]
    fn test_trailing_empty_output_overrides_earlier_html() {
        let result = result(json!({ "outputs": [
            { "outputs": [{
                "component_display_name": "Website Output",
                "results": { "html": "<p>first</p>" }
            }] },
            { "outputs": [{
                "component_display_name": "Website Output",
                "results": { "html": "" }
            }] }
        ] }));
        assert!(extract_html(&result, "Website Output").is_none());
    }

    #[test]
    fn test_no_outputs() {
        assert!(extract_html(&GenerationResult::default(), "Website Output").is_none());
    }

    #[test]
    fn test_configured_role_name() {
        let result = result(json!({ "outputs": [{ "outputs": [{
            "component_display_name": "Page HTML",
            "results": { "html": "<p>custom</p>" }
        }] }] }));
        assert!(extract_html(&result, "Website Output").is_none());
        assert_eq!(extract_html(&result, "Page HTML").as_deref(), Some("<p>custom</p>"));
    }
}
