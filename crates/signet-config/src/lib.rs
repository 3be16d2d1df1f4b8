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

//! Configuration for the Signet watcher: typed models, defaults, validation,
//! and a layered loader (defaults, then YAML file, then environment).
//!
//! Layout: `model.rs` (typed config models and patches), `defaults.rs`
//! (default values), `validate.rs` (validation helpers), `loader.rs`
//! (file + environment loading).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_PATH_ENV, ConfigLoader, DEFAULT_CONFIG_FILE, is_missing_file};
pub use model::{HttpConfig, LoggingSettings, SignetConfig, WatchConfig, WatchConfigPatch};
pub use validate::{
    normalize_keywords, validate_config, validate_filename_pattern, validate_watch_config,
};
