//! Integration tests for the website server
//!
//! These tests use wiremock as the generation pipeline and drive the full
//! HTTP surface end-to-end against an on-disk flow database.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use flowsite::config::{
    Config, FeatureFlags, GenerationConfig, ServerConfig, StorageConfig, TelemetryConfig,
};
use flowsite::server::{build_router, PageServer};
use flowsite::storage::{open_storage, Flow, FlowRepository, NewFlow};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing generation at `endpoint`
fn create_test_config(endpoint: &str, db_path: &Path, telemetry: Option<String>) -> Config {
    Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        generation: GenerationConfig {
            endpoint: endpoint.to_string(),
            timeout_secs: 5,
            output_component: "Website Output".to_string(),
            api_key: Some("secret".to_string()),
        },
        storage: StorageConfig {
            database_path: db_path.display().to_string(),
        },
        features: FeatureFlags::default(),
        telemetry: TelemetryConfig {
            endpoint: telemetry,
        },
    }
}

fn website_input(use_store: bool, require_link: bool, pages: Value) -> Value {
    json!({
        "id": "WebsiteInput-1",
        "data": {
            "type": "WebsiteInput",
            "node": { "template": {
                "use_store": { "value": use_store },
                "require_link": { "value": require_link },
                "page_store": { "value": pages }
            } }
        }
    })
}

/// Run response carrying `html` the way the pipeline reports a text output
fn run_response(html: &str) -> Value {
    json!({
        "session_id": "session-1",
        "outputs": [{
            "inputs": { "input_value": "" },
            "outputs": [
                {
                    "component_display_name": "Chat Output",
                    "component_id": "ChatOutput-1",
                    "results": { "message": { "text": "ignored" } }
                },
                {
                    "component_display_name": "Website Output",
                    "component_id": "WebsiteOutput-1",
                    "results": { "html": { "text_key": "html", "data": { "html": html } } }
                }
            ]
        }]
    })
}

struct Site {
    app: Router,
    flow: Flow,
    db_path: std::path::PathBuf,
    _dir: TempDir,
}

fn create_site(pipeline: &MockServer, nodes: Vec<Value>, telemetry: Option<String>) -> Site {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("flows.db");

    let flows = open_storage(&db_path).expect("Failed to open storage");
    let flow = flows
        .insert_flow(&NewFlow {
            name: "My Site".to_string(),
            endpoint_name: Some("my-site".to_string()),
            data: json!({ "nodes": nodes }),
        })
        .expect("Failed to insert flow");

    let config = create_test_config(&pipeline.uri(), &db_path, telemetry);
    let server = PageServer::from_config(&config, Arc::new(flows)).expect("Failed to build server");

    Site {
        app: build_router(Arc::new(server)),
        flow,
        db_path,
        _dir: dir,
    }
}

impl Site {
    async fn get(&self, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    /// Stored paths, read through a fresh connection to the database file
    fn stored_paths(&self) -> Vec<String> {
        let flows = open_storage(&self.db_path).expect("Failed to reopen storage");
        let flow = flows.load_flow(self.flow.id).expect("Flow should exist");
        flow.website_components()
            .into_iter()
            .flat_map(|c| c.page_store.enumerate().to_vec())
            .map(|entry| entry.path)
            .collect()
    }

    /// Waits for the detached write-back to land
    async fn wait_for_stored(&self, count: usize) -> Vec<String> {
        for _ in 0..100 {
            let paths = self.stored_paths();
            if paths.len() >= count {
                return paths;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.stored_paths()
    }
}

#[tokio::test]
async fn test_generated_page_is_stored_and_served_from_store() {
    let pipeline = MockServer::start().await;
    let site = create_site(&pipeline, vec![website_input(true, false, json!([]))], None);

    Mock::given(method("POST"))
        .and(path(format!("/api/v1/run/{}", site.flow.id)))
        .and(query_param("stream", "false"))
        .and(header("x-api-key", "secret"))
        .and(body_partial_json(json!({
            "input_type": "website",
            "output_type": "website",
            "tweaks": { "WebsiteInput-1": { "path": "/", "data": { "lang": "en" } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response("<h1>Hi</h1>")))
        .expect(1)
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/?lang=en").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>Hi</h1>");

    assert_eq!(site.wait_for_stored(1).await, vec!["/".to_string()]);

    let (status, body) = site.get("/website/my-site/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>Hi</h1>");
}

#[tokio::test]
async fn test_link_gating_follows_stored_pages() {
    let pipeline = MockServer::start().await;
    let home = r#"<a href="blog/post1">First post</a> <a href="https://elsewhere.example/">x</a>"#;
    let site = create_site(
        &pipeline,
        vec![website_input(true, true, json!([{ "path": "/", "content": home }]))],
        None,
    );

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tweaks": { "WebsiteInput-1": { "path": "/blog/post1" } }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(run_response(r#"<a href="/about">About</a>"#)),
        )
        .expect(1)
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/secret").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "detail": "Page not found" })
    );

    let (status, _) = site.get("/website/my-site/blog/post1").await;
    assert_eq!(status, StatusCode::OK);
    let stored = site.wait_for_stored(2).await;
    assert_eq!(stored, vec!["/".to_string(), "/blog/post1".to_string()]);

    // Links of the newly stored page open up further paths
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tweaks": { "WebsiteInput-1": { "path": "/about" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response("<p>About</p>")))
        .expect(1)
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<p>About</p>");
}

#[tokio::test]
async fn test_pipeline_error_is_reported_as_500() {
    let pipeline = MockServer::start().await;
    let site = create_site(&pipeline, vec![website_input(true, false, json!([]))], None);

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "Component failed" })),
        )
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = serde_json::from_str::<Value>(&body).unwrap()["detail"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    assert!(detail.contains("Component failed"), "unexpected detail: {detail}");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(site.stored_paths().is_empty());
}

#[tokio::test]
async fn test_missing_website_output() {
    let pipeline = MockServer::start().await;
    let site = create_site(&pipeline, vec![website_input(false, false, json!([]))], None);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "outputs": [] })))
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "detail": "No HTML output returned from the flow" })
    );
}

#[tokio::test]
async fn test_flow_without_website_input_is_misconfigured() {
    let pipeline = MockServer::start().await;
    let site = create_site(
        &pipeline,
        vec![json!({ "id": "ChatInput-1", "data": { "type": "ChatInput" } })],
        None,
    );

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response("<p>x</p>")))
        .expect(0)
        .mount(&pipeline)
        .await;

    let (status, body) = site.get("/website/my-site/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Add a Website Input component"));
}

#[tokio::test]
async fn test_post_json_body_reaches_pipeline() {
    let pipeline = MockServer::start().await;
    let site = create_site(&pipeline, vec![website_input(false, false, json!([]))], None);

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "tweaks": { "WebsiteInput-1": { "path": "/contact", "data": { "name": "Ada" } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(run_response("<p>Thanks</p>")))
        .expect(1)
        .mount(&pipeline)
        .await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/website/my-site/contact")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name": "Ada"}"#))
        .expect("request should build");
    let (status, body) = site.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<p>Thanks</p>");
}

#[tokio::test]
async fn test_run_events_are_posted() {
    let pipeline = MockServer::start().await;
    let collector = MockServer::start().await;
    let site = create_site(
        &pipeline,
        vec![website_input(true, true, json!([]))],
        Some(format!("{}/events", collector.uri())),
    );

    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_partial_json(json!({
            "is_website": true,
            "success": false,
            "error_message": "Page not found"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&collector)
        .await;

    let (status, _) = site.get("/website/my-site/unlinked").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..50 {
        if !collector.received_requests().await.unwrap_or_default().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    collector.verify().await;
}
