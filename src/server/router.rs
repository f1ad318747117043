//! HTTP routes
//!
//! - `GET /website/{flow}`: redirect page pointing at `/website/{flow}/`
//! - `GET|POST /website/{flow}/`: the root page
//! - `GET|POST /website/{flow}/{*page_path}`: any other page
//!
//! The page path is taken from the request URI as sent, still
//! percent-encoded, so it compares equal to stored paths and extracted links.

use crate::server::error::ServeError;
use crate::server::page_server::PageServer;
use crate::server::request::PageRequest;
use askama::Template;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

const WEBSITE_PREFIX: &str = "/website/";

#[derive(Clone)]
pub struct AppState {
    pub server: Arc<PageServer>,
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
  <head>
    <meta http-equiv="refresh" content="0; url={{ target }}">
    <script>window.location.replace({{ target_js|safe }});</script>
  </head>
  <body><p>Redirecting to <a href="{{ target }}">{{ target }}</a></p></body>
</html>"#,
    ext = "html"
)]
struct RedirectTemplate {
    target: String,
    /// `target` as a JavaScript string literal, safe inside `<script>`
    target_js: String,
}

impl RedirectTemplate {
    fn new(target: String) -> Self {
        Self {
            target_js: script_string(&target),
            target,
        }
    }
}

pub fn build_router(server: Arc<PageServer>) -> Router {
    Router::new()
        .route("/website/{flow}", get(redirect_to_root))
        .route("/website/{flow}/", get(serve_page).post(serve_page))
        .route("/website/{flow}/{*page_path}", get(serve_page).post(serve_page))
        .with_state(AppState { server })
}

async fn redirect_to_root(uri: Uri) -> Response {
    let target = match uri.query() {
        Some(query) => format!("{}/?{}", uri.path(), query),
        None => format!("{}/", uri.path()),
    };

    match RedirectTemplate::new(target).render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render redirect page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn serve_page(
    State(state): State<AppState>,
    method: Method,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    body: Bytes,
) -> Response {
    let Some(flow) = params.get("flow") else {
        return ServeError::NotFound(String::new()).into_response();
    };

    let request = PageRequest {
        method,
        page_path: raw_page_path(uri.path()).to_string(),
        query: uri.query().map(str::to_string),
        body,
    };

    match state.server.serve(flow, request).await {
        Ok(served) => Html(served.html).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Quotes `value` as a JSON string that cannot close the enclosing script
fn script_string(value: &str) -> String {
    Value::String(value.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Returns the part of `/website/{flow}/{rest}` after the flow segment
fn raw_page_path(uri_path: &str) -> &str {
    uri_path
        .strip_prefix(WEBSITE_PREFIX)
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, page)| page)
        .unwrap_or_default()
}
