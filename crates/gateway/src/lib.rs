//! HTTP gateway for SurveyAssist.
//!
//! Routes:
//!
//! - `GET  /health`         liveness and version
//! - `POST /api/evaluate`   evaluate an answer, always 200 unless the request is invalid
//! - `POST /api/introduce`  stream a question introduction as plain text
//!
//! Requests are independent. The shared state is read-only.

pub mod api;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use surveyassist_assist::{AssistanceEvaluator, QuestionIntroducer};
use surveyassist_config::{AppConfig, GatewayConfig};
use surveyassist_core::Provider;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub evaluator: AssistanceEvaluator,
    pub introducer: QuestionIntroducer,
    /// Include field-level validation issues in 400 responses.
    pub expose_error_details: bool,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Build both pipelines on one provider.
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            evaluator: AssistanceEvaluator::new(provider.clone(), config.evaluation.clone()),
            introducer: QuestionIntroducer::new(provider, config.introduction.clone()),
            expose_error_details: config.gateway.expose_error_details,
        }
    }
}

/// Build the router with all routes and layers.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router(state))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(cors_layer(&gateway.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for browser survey clients. An empty origin list allows any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = surveyassist_providers::ProviderRouter::from_config(&config).default_provider()?;

    if !config.has_api_key() {
        warn!("No API key configured; model calls will fail and fall back");
    }

    let state = Arc::new(GatewayState::new(provider, &config));
    let app = build_router(state, &config.gateway);

    info!(
        addr = %addr,
        provider = %config.default_provider,
        evaluation_model = %config.evaluation.model,
        introduction_model = %config.introduction.model,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{StubProvider, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_version() {
        let app = build_router(test_state(StubProvider::default(), false), &GatewayConfig::default());

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let gateway = GatewayConfig {
            max_body_bytes: 64,
            ..GatewayConfig::default()
        };
        let app = build_router(test_state(StubProvider::default(), false), &gateway);

        let req = Request::builder()
            .method("POST")
            .uri("/api/evaluate")
            .header("content-type", "application/json")
            .body(Body::from("x".repeat(1024)))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn configured_origin_is_allowed() {
        let gateway = GatewayConfig {
            allowed_origins: vec!["https://survey.example.com".into()],
            ..GatewayConfig::default()
        };
        let app = build_router(test_state(StubProvider::default(), false), &gateway);

        let req = Request::builder()
            .uri("/health")
            .header("origin", "https://survey.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://survey.example.com"
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_header() {
        let gateway = GatewayConfig {
            allowed_origins: vec!["https://survey.example.com".into()],
            ..GatewayConfig::default()
        };
        let app = build_router(test_state(StubProvider::default(), false), &gateway);

        let req = Request::builder()
            .uri("/health")
            .header("origin", "https://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(!response.headers().contains_key("access-control-allow-origin"));
    }
}
