//! Prometheus metrics for the query pipeline

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::evaluation::EvaluationResult;
use crate::domain::response::PipelineNote;

const QUERY_DURATION: &str = "fair_query_duration_seconds";

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("valid uuid regex")
});
static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+(/|$)").expect("valid numeric segment regex"));

#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global recorder; returns `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(QUERY_DURATION.to_string()),
        &config.query_duration_buckets,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!("Ignoring query duration buckets: {}", e);
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("fair_agent_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!(path = %config.path, "Prometheus metrics initialized");
            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Per-query counters: outcome, failed scorers and synthesis fallbacks
pub fn record_query(result: &EvaluationResult, backend: &str, duration: Duration) {
    let response = &result.response;
    counter!(
        "fair_queries_total",
        "domain" => response.domain.as_str(),
        "status" => response.status.as_str()
    )
    .increment(1);
    histogram!(QUERY_DURATION).record(duration.as_secs_f64());

    for failed in result.failed_metrics() {
        counter!("fair_scorer_failures_total", "scorer" => failed.name.as_str()).increment(1);
    }

    let fallbacks = response
        .notes
        .iter()
        .filter(|n| matches!(n, PipelineNote::SynthesisFallback { .. }))
        .count() as u64;
    if fallbacks > 0 {
        counter!("fair_synthesis_failures_total", "backend" => backend.to_string())
            .increment(fallbacks);
    }
}

/// Replace ids in a URL path so labels stay low-cardinality
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");
    path.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_ids() {
        assert_eq!(
            sanitize_path("/v1/queries/550e8400-e29b-41d4-a716-446655440000"),
            "/v1/queries/{id}"
        );
        assert_eq!(sanitize_path("/v1/items/123/scores"), "/v1/items/{id}/scores");
        assert_eq!(sanitize_path("/health"), "/health");
    }

    #[test]
    fn test_sanitize_path_truncates() {
        let long = "/a".repeat(60);
        assert_eq!(sanitize_path(&long).len(), 50);
    }
}
