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

//! Core event bus for the Signet watcher.
//!
//! The bus provides a typed event enum, sequential identifiers, and support for
//! replaying recent events when subscribers reconnect (e.g. SSE clients that
//! supply `Last-Event-ID`). Internally it uses `tokio::broadcast` with a bounded
//! buffer; when the channel overflows, the oldest events are dropped.
//!
//! Layout: `payloads.rs` (event and envelope types), `routing.rs` (`EventBus`).

pub mod payloads;
pub mod routing;

pub use payloads::{Event, EventEnvelope, EventId, OutcomeStatus, WatcherState};
pub use routing::{EventBus, EventStream};
