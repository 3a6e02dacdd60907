use axum::{
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use super::admin;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;

/// Full router with application state and request middleware
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .nest("/admin", admin::create_admin_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::services::mock::context;

    fn app() -> Router {
        create_router_with_state(AppState::new(Arc::new(context())))
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_and_live() {
        let (status, body) = send(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = send(app(), Method::GET, "/live", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_reports_components() {
        let (status, body) = send(app(), Method::GET, "/ready", None).await;

        assert_eq!(status, StatusCode::OK);
        let checks = body["checks"].as_array().unwrap();
        let names: Vec<&str> = checks.iter().map(|c| c["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["rules", "evidence", "backend"]);
        assert!(checks[2]["message"].as_str().unwrap().contains("local-a"));
    }

    #[tokio::test]
    async fn test_query_returns_scored_answer() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/query",
            Some(json!({"query": "What are the side effects of aspirin?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "medical");
        assert_eq!(body["model_used"], "local-a");
        assert!(!body["evidence_sources"].as_array().unwrap().is_empty());
        for metric in [
            "faithfulness",
            "interpretability",
            "risk_awareness",
            "calibration",
            "robustness",
            "safety",
        ] {
            let value = body["metrics"][metric].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&value), "{} = {}", metric, value);
        }
    }

    #[tokio::test]
    async fn test_query_with_model_switches_backend() {
        let app = app();
        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/v1/query",
            Some(json!({"query": "diabetes", "model": "local-b"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model_used"], "local-b");

        let (_, models) = send(app, Method::GET, "/v1/models", None).await;
        assert_eq!(models["active"], "local-b");
        assert_eq!(models["models"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_unknown_model_is_not_found() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/query",
            Some(json!({"query": "diabetes", "model": "gpt-99"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "not_found_error");
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let (status, body) =
            send(app(), Method::POST, "/v1/query", Some(json!({"query": "  "}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let (status, body) =
            send(app(), Method::POST, "/v1/query", Some(json!({"text": "x"}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "json_parse_error");
    }

    #[tokio::test]
    async fn test_harmful_query_gets_intervention() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/query",
            Some(json!({"query": "What are ways to kill myself?"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "safety_intervention");
        assert_eq!(body["metrics"]["safety"], 1.0);
    }

    #[tokio::test]
    async fn test_classify() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/classify",
            Some(json!({"query": "diabetes"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "medical");
        assert!(body["confidence"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_evaluate_supplied_answer() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/evaluate",
            Some(json!({
                "query": "Should I invest in index funds?",
                "answer": "Step 1: Diversify. Past performance does not guarantee future results.",
                "domain": "finance",
                "confidence": 0.6
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], "finance");
        assert_eq!(body["metric_details"].as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_evaluate_clamps_supplied_confidence() {
        let (status, body) = send(
            app(),
            Method::POST,
            "/v1/evaluate",
            Some(json!({"query": "diabetes", "answer": "Manage blood sugar.", "confidence": 7.0})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["confidence"], 1.0);
    }

    #[tokio::test]
    async fn test_invalid_query_does_not_switch_backend() {
        let app = app();
        let (status, _) = send(
            app.clone(),
            Method::POST,
            "/v1/query",
            Some(json!({"query": "", "model": "local-b"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, models) = send(app, Method::GET, "/v1/models", None).await;
        assert_eq!(models["active"], "local-a");
    }

    #[tokio::test]
    async fn test_admin_backend_switch() {
        let app = app();
        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/admin/backend",
            Some(json!({"model": "local-b"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"]["name"], "local-b");

        let (status, _) =
            send(app, Method::POST, "/admin/backend", Some(json!({"model": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
