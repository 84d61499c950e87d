//! Router-level tests against a real data root on disk.

mod support;

use appforge_api::ApiConfig;
use appforge_test_utils::{fixtures, ScriptedGenerator, TestDataRoot};
use axum::http::{Method, StatusCode};
use serde_json::json;
use support::TestApp;

// ============================================================================
// REFERENCE DOCUMENTS
// ============================================================================

#[tokio::test]
async fn test_static_documents_are_served_verbatim() {
    let app = TestApp::populated();

    let res = app.get("/api/template").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.content_type.as_deref(), Some("application/json"));
    assert_eq!(res.text(), fixtures::TEMPLATE_INDEX);

    let res = app.get("/api/table").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), fixtures::TABLE_INDEX);

    let res = app.get("/api/table/customers").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), fixtures::CUSTOMERS_TABLE);
}

#[tokio::test]
async fn test_static_documents_are_not_parsed() {
    let root = TestDataRoot::new().unwrap();
    root.write_template_index("not json at all {").unwrap();
    let app = TestApp::with_root(root, ApiConfig::default(), ScriptedGenerator::succeeding("/out"));

    let res = app.get("/api/template").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "not json at all {");
}

#[tokio::test]
async fn test_missing_static_documents_are_500_with_message() {
    let app = TestApp::empty();

    let cases = [
        ("/api/template", "TEMPLATE_INDEX_NOT_FOUND", "Template index not found"),
        ("/api/table", "TABLE_INDEX_NOT_FOUND", "Table index not found"),
        ("/api/table/nope", "TABLE_NOT_FOUND", "Table definition not found"),
    ];
    for (uri, code, message) in cases {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(res.json(), json!({"code": code, "message": message}), "{}", uri);
    }
}

#[tokio::test]
async fn test_table_name_cannot_escape_data_root() {
    let app = TestApp::populated();
    let res = app.get("/api/table/..%2Ftemplate").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "TABLE_NOT_FOUND");
}

// ============================================================================
// APPLICATION READS
// ============================================================================

#[tokio::test]
async fn test_list_returns_every_application() {
    let app = TestApp::populated();
    let res = app.get("/api/application").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.names(), vec!["crm", "customers", "orders"]);
}

#[tokio::test]
async fn test_list_without_application_directory_is_empty() {
    let app = TestApp::empty();
    let res = app.get("/api/application").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!([]));
}

#[tokio::test]
async fn test_search_by_name_and_table() {
    let app = TestApp::populated();

    assert_eq!(app.get("/api/application?name=crm").await.names(), vec!["crm"]);
    assert_eq!(app.get("/api/application?table=orders").await.names(), vec!["orders"]);
    assert!(app
        .get("/api/application?name=crm&table=orders")
        .await
        .names()
        .is_empty());
}

#[tokio::test]
async fn test_search_q_matches_name_or_table() {
    let app = TestApp::populated();
    // "customers" is crm's table and the name of another application.
    assert_eq!(
        app.get("/api/application?q=customers").await.names(),
        vec!["crm", "customers"]
    );
    assert!(app.get("/api/application?q=cust").await.names().is_empty());
}

#[tokio::test]
async fn test_search_drops_malformed_tokens_and_keeps_last_duplicate() {
    let app = TestApp::populated();

    assert_eq!(
        app.get("/api/application?name&table=a=b&q=orders").await.names(),
        vec!["orders"]
    );
    assert_eq!(
        app.get("/api/application?name=crm&name=orders").await.names(),
        vec!["orders"]
    );
    assert_eq!(app.get("/api/application?name=").await.names().len(), 3);
    assert_eq!(app.get("/api/application?colour=red").await.names().len(), 3);
}

#[tokio::test]
async fn test_search_values_are_not_percent_decoded() {
    let root = TestDataRoot::new().unwrap();
    root.write_application_raw("spaced.json", r#"{"name":"my app","table":"t"}"#)
        .unwrap();
    let app = TestApp::with_root(root, ApiConfig::default(), ScriptedGenerator::succeeding("/out"));

    assert!(app.get("/api/application?name=my%20app").await.names().is_empty());

    // Path segments, unlike query values, are decoded.
    let res = app.get("/api/application/my%20app").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "my app");
}

#[tokio::test]
async fn test_get_application_by_name() {
    let app = TestApp::populated();

    let res = app.get("/api/application/crm").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["name"], "crm");
    assert_eq!(body["table"], "customers");
    assert_eq!(body["fields"][0]["label"], "Email");
}

#[tokio::test]
async fn test_get_missing_application_is_500_with_message() {
    let app = TestApp::populated();
    let res = app.get("/api/application/nope").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json(),
        json!({"code": "APPLICATION_NOT_FOUND", "message": "Application not found"})
    );
}

#[tokio::test]
async fn test_missing_as_404_promotes_resource_misses() {
    let root = TestDataRoot::new().unwrap();
    let config = ApiConfig {
        missing_as_404: true,
        ..ApiConfig::default()
    };
    let app = TestApp::with_root(root, config, ScriptedGenerator::succeeding("/out"));

    let res = app.get("/api/application/nope").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["message"], "Application not found");

    // A data error is not a miss.
    let res = app.post("/api/application", "{").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unparsable_application_file_is_skipped() {
    let root = fixtures::populated_root().unwrap();
    root.write_application_raw("broken.json", "{ nope").unwrap();
    let app = TestApp::with_root(root, ApiConfig::default(), ScriptedGenerator::succeeding("/out"));

    assert_eq!(app.get("/api/application").await.names().len(), 3);
}

#[tokio::test]
async fn test_strict_scan_turns_bad_file_into_empty_500() {
    let root = fixtures::populated_root().unwrap();
    root.write_application_raw("broken.json", "{ nope").unwrap();
    let config = ApiConfig {
        skip_invalid_files: false,
        ..ApiConfig::default()
    };
    let store = std::sync::Arc::new(root.file_store().with_skip_invalid(false));
    let state = appforge_api::AppState::new(
        store,
        std::sync::Arc::new(ScriptedGenerator::succeeding("/out")),
        config,
    );
    let router = appforge_api::create_api_router(state);

    use tower::ServiceExt;
    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/application")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

// ============================================================================
// APPLICATION WRITES
// ============================================================================

#[tokio::test]
async fn test_create_then_list_reflects_it() {
    let app = TestApp::populated();
    assert_eq!(app.get("/api/application").await.names().len(), 3);

    let res = app
        .post("/api/application", r#"{"name":"billing","table":"invoices"}"#)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "billing");

    assert_eq!(
        app.get("/api/application").await.names(),
        vec!["billing", "crm", "customers", "orders"]
    );
    assert_eq!(
        app.get("/api/application?table=invoices").await.names(),
        vec!["billing"]
    );

    let on_disk = app.root.read_application("billing").unwrap();
    assert_eq!(on_disk, json!({"name": "billing", "table": "invoices"}));
}

#[tokio::test]
async fn test_create_overwrites_existing_application() {
    let app = TestApp::populated();
    app.get("/api/application").await;

    let res = app
        .post("/api/application", r#"{"name":"crm","table":"leads"}"#)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let body = app.get("/api/application/crm").await.json();
    assert_eq!(body, json!({"name": "crm", "table": "leads"}));
}

#[tokio::test]
async fn test_malformed_create_is_data_error_and_still_invalidates() {
    let app = TestApp::populated();
    app.get("/api/application").await;
    assert!(app.state.cache.stats().cached);

    // Written behind the cache's back, then a failed create.
    app.root
        .write_application(&appforge_core::Application::new("sidecar"))
        .unwrap();
    let res = app.post("/api/application", "{ not json").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json(),
        json!({"code": "DATA_ERROR", "message": "Application data error"})
    );

    assert!(app.get("/api/application").await.names().contains(&"sidecar".to_string()));
}

#[tokio::test]
async fn test_create_without_name_is_data_error() {
    let app = TestApp::populated();
    let res = app.post("/api/application", r#"{"table":"x"}"#).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "DATA_ERROR");
    assert_eq!(app.root.application_files().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_rejects_path_like_names() {
    let app = TestApp::populated();
    let res = app
        .post("/api/application", r#"{"name":"../escape","table":"x"}"#)
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "DATA_ERROR");
}

#[tokio::test]
async fn test_put_forces_name_from_path() {
    let app = TestApp::populated();

    let res = app
        .put(
            "/api/application/orders",
            r#"{"name":"somethingelse","table":"orders","team":"returns"}"#,
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["name"], "orders");

    let on_disk = app.root.read_application("orders").unwrap();
    assert_eq!(on_disk["name"], "orders");
    assert_eq!(on_disk["team"], "returns");
    assert_eq!(app.root.application_files().unwrap().len(), 3);

    let body = app.get("/api/application/orders").await.json();
    assert_eq!(body["team"], "returns");
}

#[tokio::test]
async fn test_put_creates_when_absent() {
    let app = TestApp::populated();
    let res = app.put("/api/application/fresh", r#"{"table":"t"}"#).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(app.get("/api/application?name=fresh").await.names(), vec!["fresh"]);
}

#[tokio::test]
async fn test_put_is_visible_through_a_warm_cache() {
    let app = TestApp::populated();
    assert_eq!(app.get("/api/application").await.names().len(), 3);
    assert_eq!(app.get("/api/application/orders").await.json()["team"], "fulfilment");
    assert!(app.state.cache.stats().cached);

    let res = app
        .put("/api/application/orders", r#"{"table":"shipments","team":"returns"}"#)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let body = app.get("/api/application/orders").await.json();
    assert_eq!(body, json!({"name": "orders", "table": "shipments", "team": "returns"}));

    let listed = app.get("/api/application").await.json();
    let orders = listed
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["name"] == "orders")
        .cloned()
        .unwrap();
    assert_eq!(orders["team"], "returns");

    assert_eq!(
        app.get("/api/application?table=shipments").await.names(),
        vec!["orders"]
    );
    assert!(app.get("/api/application?table=orders").await.names().is_empty());
}

#[tokio::test]
async fn test_dot_prefixed_name_round_trips() {
    let app = TestApp::populated();
    app.get("/api/application").await;

    let res = app
        .post("/api/application", r#"{"name":".cfg","table":"t1"}"#)
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app.get("/api/application/.cfg").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"name": ".cfg", "table": "t1"}));
    assert_eq!(
        app.get("/api/application").await.names(),
        vec![".cfg", "crm", "customers", "orders"]
    );
}

#[tokio::test]
async fn test_put_with_malformed_body_is_data_error() {
    let app = TestApp::populated();
    let res = app.put("/api/application/crm", "[1, 2").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "DATA_ERROR");
}

// ============================================================================
// GENERATION
// ============================================================================

#[tokio::test]
async fn test_generate_success() {
    let app = TestApp::populated();
    let res = app
        .post(
            "/api/generate",
            r#"{"application":"crm","session":"s-1","templates":["api","ui"]}"#,
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"application": "crm", "outputPath": "/out/crm"}));

    let calls = app.generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].session.as_deref(), Some("s-1"));
    assert_eq!(calls[0].templates, vec!["api", "ui"]);
}

#[tokio::test]
async fn test_generate_forwards_missing_fields_by_default() {
    let app = TestApp::populated();
    let res = app.post("/api/generate", "{}").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["application"], serde_json::Value::Null);

    let calls = app.generator.calls();
    assert_eq!(calls[0].application, None);
    assert!(calls[0].templates.is_empty());
}

#[tokio::test]
async fn test_generate_with_validation_rejects_incomplete_request() {
    let root = TestDataRoot::new().unwrap();
    let config = ApiConfig {
        validate_generation: true,
        ..ApiConfig::default()
    };
    let app = TestApp::with_root(root, config, ScriptedGenerator::succeeding("/out"));

    let res = app.post("/api/generate", r#"{"application":"crm"}"#).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "DATA_ERROR");
    assert!(app.generator.calls().is_empty());
}

#[tokio::test]
async fn test_generate_engine_failure_relays_message() {
    let root = TestDataRoot::new().unwrap();
    let app = TestApp::with_root(
        root,
        ApiConfig::default(),
        ScriptedGenerator::failing("template 'ui' not found"),
    );

    let res = app
        .post("/api/generate", r#"{"application":"crm","templates":["ui"]}"#)
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json(),
        json!({"code": "GENERATION_FAILED", "message": "template 'ui' not found"})
    );
}

#[tokio::test]
async fn test_generate_unparsable_body_never_reaches_engine() {
    let app = TestApp::populated();
    let res = app.post("/api/generate", "application=crm").await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["code"], "DATA_ERROR");
    assert!(app.generator.calls().is_empty());
}

// ============================================================================
// ROUTING
// ============================================================================

#[tokio::test]
async fn test_unrouted_requests_are_empty_404() {
    let app = TestApp::populated();

    let cases = [
        (Method::DELETE, "/api/application/crm"),
        (Method::POST, "/api/template"),
        (Method::PUT, "/api/application"),
        (Method::GET, "/api/generate"),
        (Method::PATCH, "/api/application/crm"),
        (Method::GET, "/api/application/crm/extra"),
        (Method::GET, "/api/application/"),
        (Method::GET, "/api/unknown"),
        (Method::GET, "/"),
    ];
    for (method, uri) in cases {
        let res = app.send(method.clone(), uri, None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert!(res.body.is_empty(), "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_unrouted_requests_touch_nothing() {
    let app = TestApp::populated();
    app.send(Method::DELETE, "/api/application/crm", None).await;
    assert_eq!(app.root.application_files().unwrap().len(), 3);
    assert_eq!(app.state.cache.stats().rebuilds, 0);
}

// ============================================================================
// HEALTH AND METRICS
// ============================================================================

#[tokio::test]
async fn test_readiness_reports_cache_and_storage() {
    let app = TestApp::populated();
    app.get("/api/application").await;

    let res = app.get("/health/ready").await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["cache"]["entries"], 3);
    assert_eq!(body["details"]["cache"]["rebuilds"], 1);
}

#[tokio::test]
async fn test_readiness_fails_when_data_root_is_gone() {
    let root = TestDataRoot::new().unwrap();
    let store = std::sync::Arc::new(appforge_storage::FileStore::new(
        appforge_core::DataLayout::new(root.path().join("missing")),
    ));
    let state = appforge_api::AppState::new(
        store,
        std::sync::Arc::new(ScriptedGenerator::succeeding("/out")),
        ApiConfig::default(),
    );
    let router = appforge_api::create_api_router(state);

    use tower::ServiceExt;
    let response = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/health/ready")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_cache_counters() {
    let app = TestApp::populated();
    app.get("/api/application").await;
    app.get("/api/application/crm").await;

    let res = app.get("/metrics").await;
    assert_eq!(res.status, StatusCode::OK);
    let text = res.text();
    assert!(text.contains("appforge_cache_rebuilds_total"));
    assert!(text.contains("appforge_http_requests_total"));
    assert!(text.contains("appforge_cache_hit_ratio"));
}
