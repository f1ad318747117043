use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Message returned when a run produced no usable page
pub const NO_HTML_OUTPUT: &str = "No HTML output returned from the flow";

/// Failures of a single page request
///
/// Each variant maps to one status code. The display text is what the
/// client sees and what telemetry records.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Query string or JSON body could not be parsed
    #[error("{0}")]
    BadRequestBody(String),

    /// The flow has no website input component
    #[error("Add a Website Input component to serve a website")]
    Misconfigured,

    /// Link gating rejected a path that is not linked from any stored page
    #[error("Page not found")]
    Forbidden(String),

    /// The pipeline failed, timed out or returned no HTML
    #[error("{0}")]
    GenerationFailed(String),

    /// No flow matches the identifier
    #[error("Website not found")]
    NotFound(String),

    /// The flow could not be read
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ServeError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequestBody(_)
            | Self::Misconfigured
            | Self::GenerationFailed(_)
            | Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServeError::BadRequestBody("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ServeError::Misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServeError::Forbidden("/x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServeError::GenerationFailed("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ServeError::NotFound("site".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_messages_do_not_echo_internal_detail() {
        assert_eq!(ServeError::Forbidden("/secret".into()).to_string(), "Page not found");
        assert_eq!(ServeError::NotFound("site".into()).to_string(), "Website not found");
        assert_eq!(
            ServeError::Misconfigured.to_string(),
            "Add a Website Input component to serve a website"
        );
    }

    #[test]
    fn test_response_has_status() {
        let response = ServeError::Forbidden("/x".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
