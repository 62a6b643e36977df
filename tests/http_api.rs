use actions_timing::server::{router, ADD_ACTION_PATH, GET_STATS_PATH, HEALTH_PATH};
use actions_timing::{ActionsTiming, Config, ScratchTableProvider};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_database(dir.path().join("http.db"));
    let tables = ScratchTableProvider::new("main");
    let service = ActionsTiming::open_with_tables(&config, &tables).unwrap();
    (dir, router(Arc::new(service)))
}

async fn post_json(app: &Router, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(ADD_ACTION_PATH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn stats(app: &Router) -> Vec<Value> {
    let response = get(app, GET_STATS_PATH).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let mut stats = body_json(response).await.as_array().unwrap().clone();
    stats.sort_by(|a, b| a["Name"].as_str().cmp(&b["Name"].as_str()));
    stats
}

#[tokio::test]
async fn test_empty_stats() {
    let (_dir, app) = app();
    assert!(stats(&app).await.is_empty());
}

#[tokio::test]
async fn test_add_then_get_stats() {
    let (_dir, app) = app();

    for body in [
        r#"{"Action":"Run","Time":100}"#,
        r#"{"Action":"Run","Time":200}"#,
        r#"{"action":"Walk","time":1000}"#,
    ] {
        let response = post_json(&app, body).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(bytes.is_empty());
    }

    assert_eq!(
        stats(&app).await,
        vec![
            json!({"Name": "Run", "Avg": 150.0}),
            json!({"Name": "Walk", "Avg": 1000.0}),
        ]
    );
}

#[tokio::test]
async fn test_fractional_average() {
    let (_dir, app) = app();
    post_json(&app, r#"{"Action":"Run","Time":99.9}"#).await;
    post_json(&app, r#"{"Action":"Run","Time":107.5}"#).await;

    let stats = stats(&app).await;
    assert_eq!(stats.len(), 1);
    assert!((stats[0]["Avg"].as_f64().unwrap() - 103.7).abs() < 1e-9);
}

#[tokio::test]
async fn test_malformed_submissions_are_client_errors() {
    let (_dir, app) = app();

    for body in [
        r#"{"Time":100}"#,
        r#"{"Action":"Run","Time":"fast"}"#,
        r#"{"Action":"","Time":1}"#,
        r#"{"Action":"Run""#,
    ] {
        let response = post_json(&app, body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let error = body_json(response).await;
        assert_eq!(error["error"]["code"], "validation_error");
    }

    assert!(stats(&app).await.is_empty());
}

#[tokio::test]
async fn test_injection_name_round_trips() {
    let (_dir, app) = app();
    let name = "Robert'; DROP TABLE dbo.actionTimes; --";

    post_json(&app, r#"{"Action":"Run","Time":100}"#).await;
    let response = post_json(&app, &json!({"Action": name, "Time": 100}).to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stats = stats(&app).await;
    assert_eq!(
        stats,
        vec![
            json!({"Name": name, "Avg": 100.0}),
            json!({"Name": "Run", "Avg": 100.0}),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_submissions() {
    let (_dir, app) = app();

    let requests: Vec<_> = (0..40)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let name = if i % 2 == 0 { "Run" } else { "Walk" };
                post_json(&app, &json!({"Action": name, "Time": 10}).to_string()).await.status()
            })
        })
        .collect();

    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(
        stats(&app).await,
        vec![
            json!({"Name": "Run", "Avg": 10.0}),
            json!({"Name": "Walk", "Avg": 10.0}),
        ]
    );
}

#[tokio::test]
async fn test_health_counts_requests() {
    let (_dir, app) = app();
    post_json(&app, r#"{"Action":"Run","Time":1}"#).await;
    post_json(&app, r#"{"Time":1}"#).await;

    let response = get(&app, HEALTH_PATH).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(health["requests_processed"], 2);
    assert_eq!(health["requests_failed"], 1);
}

#[tokio::test]
async fn test_unknown_route() {
    let (_dir, app) = app();
    let response = get(&app, "/ActionsTiming/v2/GetStats").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
