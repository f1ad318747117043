//! Inbound request parsing
//!
//! GET parameters come from the query string, every other method sends a
//! JSON body.

use crate::links::normalize_page_path;
use crate::server::error::ServeError;
use axum::body::Bytes;
use axum::http::Method;
use serde_json::{Map, Value};

/// A page request as received, before any parsing
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    /// Path below the website root, as sent (may lack the leading `/`)
    pub page_path: String,
    /// Raw query string, without `?`
    pub query: Option<String>,
    pub body: Bytes,
}

impl PageRequest {
    pub fn get(page_path: &str, query: Option<&str>) -> Self {
        Self {
            method: Method::GET,
            page_path: page_path.to_string(),
            query: query.map(str::to_string),
            body: Bytes::new(),
        }
    }

    pub fn post(page_path: &str, body: impl Into<Bytes>) -> Self {
        Self {
            method: Method::POST,
            page_path: page_path.to_string(),
            query: None,
            body: body.into(),
        }
    }

    pub fn normalized_path(&self) -> String {
        normalize_page_path(&self.page_path)
    }

    /// Parses the request parameters into a JSON value
    ///
    /// Query parameters become an object of strings (the last of repeated
    /// keys wins). Bodies must be valid JSON of any shape.
    pub fn parameters(&self) -> Result<Value, ServeError> {
        if self.method == Method::GET || self.method == Method::HEAD {
            return Ok(query_parameters(self.query.as_deref().unwrap_or_default()));
        }

        serde_json::from_slice(&self.body).map_err(|e| ServeError::BadRequestBody(e.to_string()))
    }
}

fn query_parameters(query: &str) -> Value {
    let params: Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    Value::Object(params)
}
