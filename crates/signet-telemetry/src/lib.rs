#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(
    dead_code,
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry primitives shared across the Signet workspace.
//!
//! This crate centralises logging, metrics, and tracing helpers so the watcher
//! pipeline and the HTTP surface share one observability story.
//!
//! Layout: `init.rs` (subscriber install), `log_stream.rs` (live log fan-out),
//! `metrics.rs` (Prometheus registry), `context.rs` (span guards), `layers.rs`
//! (request-id middleware), `error.rs` (error type).

pub mod context;
pub mod error;
pub mod init;
pub mod layers;
pub mod log_stream;
pub mod metrics;

pub use context::{GlobalContextGuard, record_app_mode};
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
pub use layers::{propagate_request_id_layer, set_request_id_layer};
pub use log_stream::{log_stream_receiver, recent_log_lines, retained_log_lines};
pub use metrics::{Metrics, MetricsSnapshot};
