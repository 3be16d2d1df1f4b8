//! Recent and live log endpoints.
//!
//! # Design
//! - Bridge structured tracing output to SSE without extra formatting layers.
//! - Allow clients to reconnect without holding server state.
//! - Emit keep-alive frames to keep proxies from closing idle streams.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json,
    extract::Query,
    response::sse::{self, Sse},
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use signet_telemetry::{log_stream_receiver, recent_log_lines, retained_log_lines};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};

use crate::http::constants::{DEFAULT_LOGS_LIMIT, MAX_LOGS_LIMIT, SSE_KEEP_ALIVE_SECS};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogsQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogsResponse {
    pub(crate) logs: Vec<String>,
    pub(crate) total: usize,
    pub(crate) has_more: bool,
}

pub(crate) async fn recent_logs(Query(query): Query<LogsQuery>) -> Json<LogsResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOGS_LIMIT)
        .clamp(1, MAX_LOGS_LIMIT);
    let logs = recent_log_lines(limit);
    let total = retained_log_lines();
    Json(LogsResponse {
        has_more: total > logs.len(),
        logs,
        total,
    })
}

pub(crate) async fn stream_logs() -> Sse<impl Stream<Item = Result<sse::Event, Infallible>> + Send>
{
    let stream = build_log_stream(log_stream_receiver());

    Sse::new(stream).keep_alive(
        sse::KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

fn build_log_stream(
    receiver: broadcast::Receiver<String>,
) -> impl Stream<Item = Result<sse::Event, Infallible>> + Send {
    BroadcastStream::new(receiver).map(|result| {
        let event = match result {
            Ok(line) => sse::Event::default().event("log").data(line),
            Err(err) => sse::Event::default()
                .event("log_status")
                .data(log_status_message(&err)),
        };
        Ok(event)
    })
}

fn log_status_message(err: &BroadcastStreamRecvError) -> String {
    match err {
        BroadcastStreamRecvError::Lagged(count) => {
            format!("log stream lagged; dropped {count} lines")
        }
    }
}
