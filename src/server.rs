//! HTTP surface: routes, CORS, and the mapping from [`RelayError`] to
//! status codes and JSON error bodies.

use crate::ai::GeminiSolutionClient;
use crate::config::Config;
use crate::error::RelayError;
use crate::relay::RelayPipeline;
use crate::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared across routes.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RelayPipeline,
}

/// HTTP-level limits and CORS policy.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub max_concurrent_requests: Option<usize>,
}

impl From<&Config> for RouterOptions {
    fn from(config: &Config) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            max_body_bytes: config.max_body_bytes,
            max_concurrent_requests: config.max_concurrent_requests,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message(),
            detail: self.detail(),
            status: self.upstream_status(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

async fn generate_solution(State(state): State<AppState>, body: Bytes) -> Response {
    match state.pipeline.handle_generate_solution(&body).await {
        Ok(solution) => Json(solution).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn readiness() -> StatusCode {
    StatusCode::OK
}

pub fn build_router(state: AppState, options: &RouterOptions) -> Router {
    let mut router = Router::new()
        // `OPTIONS` never reaches the router: the CORS layer answers it.
        .route("/generate-solution", post(generate_solution))
        .route("/readiness", get(readiness))
        .with_state(state)
        .layer(DefaultBodyLimit::max(options.max_body_bytes));

    if let Some(limit) = options.max_concurrent_requests {
        info!("Limiting in-flight requests to {}", limit);
        router = router.layer(ConcurrencyLimitLayer::new(limit));
    }

    router
        .layer(create_cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn create_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origin = if allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| origin.trim_end_matches('/').parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Wire the Gemini client from config into a ready router.
pub fn app_from_config(config: &Config) -> Router {
    let solver = GeminiSolutionClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
    )
    .with_base_url(config.gemini_base_url.clone());

    info!(
        "Solution provider: Gemini (model: {}, endpoint: {})",
        solver.model(),
        config.gemini_base_url
    );

    let state = AppState {
        pipeline: RelayPipeline::new(Arc::new(solver)),
    };
    build_router(state, &RouterOptions::from(config))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = app_from_config(&config);

    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_body_includes_status_only_for_upstream_error() {
        let body = ErrorBody {
            error: RelayError::UpstreamError { status: 429 }.message(),
            detail: RelayError::UpstreamError { status: 429 }.detail(),
            status: RelayError::UpstreamError { status: 429 }.upstream_status(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "error": "Gemini API returned non-2xx status",
                "detail": "upstream responded with status 429",
                "status": 429
            })
        );
    }

    #[test]
    fn test_malformed_request_body_has_only_error() {
        let err = RelayError::MalformedRequest("eof".to_string());
        let body = ErrorBody {
            error: err.message(),
            detail: err.detail(),
            status: err.upstream_status(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "Cannot parse JSON body" })
        );
    }

    #[test]
    fn test_router_options_from_config() {
        let config = Config::from_json(
            r#"{"server_port": "8080", "gemini_api_key": "k", "max_concurrent_requests": 2}"#,
            None,
        )
        .unwrap();
        let options = RouterOptions::from(&config);
        assert_eq!(options.max_concurrent_requests, Some(2));
        assert_eq!(options.allowed_origins.len(), 2);
    }
}
