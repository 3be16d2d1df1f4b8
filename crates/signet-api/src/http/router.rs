//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use signet_pipeline::WatchService;
use signet_telemetry::{build_sha, propagate_request_id_layer, set_request_id_layer};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::config::{get_config, update_config};
use crate::http::constants::{HEADER_LAST_EVENT_ID, HEADER_REQUEST_ID};
use crate::http::files::{preview, recent_files};
use crate::http::health::{health, metrics};
use crate::http::logs::{recent_logs, stream_logs};
use crate::http::sse::stream_events;
use crate::http::telemetry::HttpMetricsLayer;
use crate::http::watcher::{
    create_sample, debug_info, force_reset, rename_file, start, status, stop,
};
use crate::state::ApiState;

/// Axum router wrapper that hosts the Signet control API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct the API around a watch service; metrics and events come from the service.
    #[must_use]
    pub fn new(service: WatchService) -> Self {
        let state = Arc::new(ApiState::new(service));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_LAST_EVENT_ID)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(state.telemetry.clone()));

        let router = Self::build_router()
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn build_router() -> Router<Arc<ApiState>> {
        Self::public_routes().merge(Self::v1_routes())
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/debug", get(debug_info))
    }

    fn v1_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/api/v1/status", get(status))
            .route("/api/v1/start", post(start))
            .route("/api/v1/stop", post(stop))
            .route("/api/v1/force-reset", post(force_reset))
            .route("/api/v1/config", get(get_config).post(update_config))
            .route("/api/v1/files/recent", get(recent_files))
            .route("/api/v1/files/preview", get(preview))
            .route("/api/v1/logs", get(recent_logs))
            .route("/api/v1/logs/stream", get(stream_logs))
            .route("/api/v1/events", get(stream_events))
            .route("/api/v1/test/create-sample", post(create_sample))
            .route("/api/v1/test/rename", post(rename_file))
    }

    /// Consume the server and hand back the fully layered router.
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve the API on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "control API listening");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
