//! Shared harness for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;

use appforge_api::{create_api_router, ApiConfig, AppState};
use appforge_storage::DocumentStore;
use appforge_test_utils::{fixtures, ScriptedGenerator, TestDataRoot};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

/// A router over a temporary data root plus handles to inspect it.
pub struct TestApp {
    pub root: TestDataRoot,
    pub state: AppState,
    pub generator: Arc<ScriptedGenerator>,
    router: Router,
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Names of the applications in a list response, in order.
    pub fn names(&self) -> Vec<String> {
        self.json()
            .as_array()
            .expect("list response is an array")
            .iter()
            .map(|app| app["name"].as_str().expect("name is a string").to_string())
            .collect()
    }
}

impl TestApp {
    /// Populated data root, default config, succeeding generator.
    pub fn populated() -> Self {
        let root = fixtures::populated_root().expect("populate data root");
        Self::with_root(root, ApiConfig::default(), ScriptedGenerator::succeeding("/out/crm"))
    }

    /// Empty data root (no static documents, no applications directory).
    pub fn empty() -> Self {
        let root = TestDataRoot::new().expect("create data root");
        Self::with_root(root, ApiConfig::default(), ScriptedGenerator::succeeding("/out/crm"))
    }

    pub fn with_root(root: TestDataRoot, config: ApiConfig, generator: ScriptedGenerator) -> Self {
        let generator = Arc::new(generator);
        let store: Arc<dyn DocumentStore> = Arc::new(root.file_store());
        let state = AppState::new(store, generator.clone(), config);
        let router = create_api_router(state.clone());
        Self {
            root,
            state,
            generator,
            router,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();

        TestResponse {
            status,
            content_type,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &str) -> TestResponse {
        self.send(Method::PUT, uri, Some(body)).await
    }
}
