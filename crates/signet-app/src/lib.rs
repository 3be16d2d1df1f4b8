#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Signet application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (config, logging, service and API wiring),
//! `error.rs` (application error type).

/// Application bootstrap and shutdown handling.
pub mod bootstrap;
/// Application-level error type.
pub mod error;

pub use bootstrap::{BootstrapDependencies, run_app, run_app_with};
pub use error::{AppError, AppResult};
