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

//! Status and control HTTP surface for the Signet watcher.
//!
//! The router exposes the watch service (start/stop, status, recent outcomes,
//! preview, staged configuration) together with health, Prometheus metrics,
//! and two SSE streams: domain events and live log lines.
//!
//! Layout: `error.rs` (server bootstrap errors), `state.rs` (shared handler
//! state), `http/` (router, handlers, problem responses, streams, middleware).

pub mod error;
pub(crate) mod http;
pub(crate) mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
