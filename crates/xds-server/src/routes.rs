//! HTTP routes.
//!
//! | Route | Verb |
//! |---|---|
//! | `/v2/discovery:endpoints` | `POST` |
//! | `/v2/discovery:listeners` | `POST` |
//! | `/v2/discovery:clusters` | `POST` |
//! | `/config` | `GET` |
//! | `/healthz` | any |
//!
//! Discovery paths contain a `:` which the path router would read as a
//! parameter, so they are resolved in the fallback through
//! [`DiscoveryKind::from_path`].

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, Method};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument, warn};
use xds_core::{DiscoveryKind, XdsError};

use crate::config::ServerConfig;
use crate::gateway::Gateway;
use crate::metrics::GatewayMetrics;
use crate::response::ErrorResponse;
use crate::shutdown::{track_in_flight, ShutdownController};
use crate::status::StatusReporter;

/// Path of the status route.
pub const STATUS_PATH: &str = "/config";
/// Path of the liveness route.
pub const HEALTH_PATH: &str = "/healthz";

/// Shared state for every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    gateway: Gateway,
    status: StatusReporter,
    metrics: Option<GatewayMetrics>,
    max_request_size: usize,
}

impl AppState {
    /// Create handler state.
    pub fn new(
        gateway: Gateway,
        status: StatusReporter,
        metrics: Option<GatewayMetrics>,
        max_request_size: usize,
    ) -> Self {
        Self {
            gateway,
            status,
            metrics,
            max_request_size,
        }
    }
}

/// Build the router for the given state.
pub fn router(state: AppState, config: &ServerConfig, shutdown: ShutdownController) -> Router {
    let router = Router::new()
        .route(STATUS_PATH, any(status))
        .route(HEALTH_PATH, any(healthz))
        .fallback(discovery)
        .with_state(state);

    let router = if config.enable_request_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.layer(middleware::from_fn_with_state(shutdown, track_in_flight))
}

#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
async fn discovery(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path();
    let Some(kind) = DiscoveryKind::from_path(path) else {
        debug!("no route");
        return ErrorResponse::from(XdsError::route_not_found(path)).into_response();
    };

    if request.method() != Method::POST {
        warn!(kind = %kind, "discovery route called with wrong method");
        return ErrorResponse::from(XdsError::method_not_allowed(
            request.method().as_str(),
            path,
        ))
        .into_response();
    }

    let timer = state.metrics.as_ref().map(|metrics| metrics.start(kind));

    let result = match to_bytes(request.into_body(), state.max_request_size).await {
        Ok(body) => state.gateway.fetch(kind, &body),
        Err(e) => {
            warn!(kind = %kind, error = %e, "failed to read request body");
            Err(XdsError::invalid_request(
                kind.type_url(),
                format!("failed to read request body: {e}"),
            ))
        }
    };

    let response = match result {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => ErrorResponse::from(&err).into_response(),
    };

    if let Some(timer) = timer {
        timer.finish(response.status());
    }
    response
}

#[instrument(skip_all, fields(method = %method))]
async fn status(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET {
        warn!("status route called with wrong method");
        return ErrorResponse::from(XdsError::method_not_allowed(method.as_str(), STATUS_PATH))
            .into_response();
    }

    let report = state.status.report();
    if let Some(metrics) = &state.metrics {
        metrics.record_status_request(report.last_error.is_empty());
    }
    if let Some(err) = report.error() {
        debug!(error = %err, last_update = %report.last_update, "reporting refresh failure");
    }

    (report.status_code(), Json(report)).into_response()
}

async fn healthz() -> &'static str {
    "ok"
}
