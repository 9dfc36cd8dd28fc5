//! HTTP surface.
//!
//! - `GET /health` → `OK`
//! - `POST /intelligence` → aggregated intelligence (400 on invalid input)
//!
//! `/metrics` is merged in by [`app`] when the Prometheus recorder is wanted.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info_span, warn};

use crate::config::IntelligenceConfig;
use crate::engine::IntelligenceEngine;
use crate::error::IntelligenceError;
use crate::metrics::{self, Metrics};
use crate::request::AggregationRequest;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<IntelligenceEngine>,
}

impl AppState {
    pub fn new(engine: IntelligenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_config(cfg: &IntelligenceConfig) -> anyhow::Result<Self> {
        let engine = cfg.build_engine(info_span!("intelligence"))?;
        Ok(Self::new(engine))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/intelligence", post(intelligence))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Full application: API routes plus `/metrics`.
pub fn app(state: AppState) -> anyhow::Result<Router> {
    let metrics = Metrics::init()?;
    Ok(router(state).merge(metrics.router()))
}

async fn intelligence(
    State(state): State<AppState>,
    payload: Result<Json<AggregationRequest>, JsonRejection>,
) -> Response {
    metrics::record_request();

    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            metrics::record_request_error("malformed");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    // Dropping this handler (client gone) drops the fan-out, which cancels
    // in-flight adapters on its own.
    let cancel = CancellationToken::new();
    match state.engine.run(request, &cancel).await {
        Ok(run) => {
            metrics::record_run(&run);
            (StatusCode::OK, Json(run.intelligence)).into_response()
        }
        Err(IntelligenceError::InvalidRequest(e)) => {
            metrics::record_request_error("invalid");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(IntelligenceError::Cancelled) => {
            warn!(target: "api", "aggregation cancelled");
            metrics::record_request_error("cancelled");
            error_response(StatusCode::SERVICE_UNAVAILABLE, "request cancelled".to_string())
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Pipeline;
    use crate::fanout::{FanOutCoordinator, DEFAULT_ADAPTER_TIMEOUT};
    use axum::body::{self, Body};
    use axum::http::Request;
    use tower::ServiceExt as _;

    fn empty_app() -> Router {
        let engine = IntelligenceEngine::new(
            FanOutCoordinator::new(vec![], DEFAULT_ADAPTER_TIMEOUT),
            Pipeline::default(),
        );
        router(AppState::new(engine))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = empty_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn malformed_json_is_400_with_error_field() {
        let resp = empty_app()
            .oneshot(
                Request::post("/intelligence")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"categories":["tacos"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(v["error"].is_string());
    }
}
