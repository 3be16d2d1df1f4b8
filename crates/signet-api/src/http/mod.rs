//! HTTP router, handlers, and middleware.

pub(crate) mod config;
pub(crate) mod constants;
pub(crate) mod errors;
pub(crate) mod files;
pub(crate) mod health;
pub(crate) mod logs;
pub(crate) mod router;
pub(crate) mod sse;
pub(crate) mod telemetry;
pub(crate) mod watcher;
