//! Typed configuration models and change payloads.
//!
//! # Design
//! - Pure data carriers shared by the loader, the watcher service, and the API.
//! - Every struct deserializes with defaults so partial YAML files are valid.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigResult;
use crate::validate::{normalize_keywords, validate_watch_config};

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignetConfig {
    /// Watcher and pipeline settings.
    pub watch: WatchConfig,
    /// HTTP listener settings.
    pub http: HttpConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Start watching as soon as the process boots.
    pub auto_start: bool,
}

/// Settings consumed by the file-processing pipeline.
///
/// A running watcher holds an immutable snapshot of this struct; updates
/// take effect on the next start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory monitored for incoming PDFs (non-recursive).
    pub workplace_path: PathBuf,
    /// Root of the `doc/client/date/status` destination tree.
    pub destination_root: PathBuf,
    /// Upper bound on the stability wait, in seconds.
    pub stability_timeout_secs: f64,
    /// Requested stability poll interval, in milliseconds.
    pub poll_interval_ms: u64,
    /// Compute destinations without creating directories or moving files.
    pub dry_run: bool,
    /// Lowercase keywords that mark a status segment as signed.
    pub status_keywords: Vec<String>,
    /// Case-insensitive filename pattern with `doc`, `client`, `date`, `status` groups.
    pub filename_pattern: String,
    /// Number of outcomes kept in the recent history.
    pub history_capacity: usize,
    /// Pause after an unexpected worker error, in milliseconds.
    pub error_backoff_ms: u64,
    /// Queue PDFs already present in the workplace when the watcher starts.
    pub process_existing: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            workplace_path: PathBuf::from(defaults::WORKPLACE_PATH),
            destination_root: PathBuf::from(defaults::DESTINATION_ROOT),
            stability_timeout_secs: defaults::STABILITY_TIMEOUT_SECS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            dry_run: false,
            status_keywords: defaults::STATUS_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            filename_pattern: defaults::FILENAME_PATTERN.to_string(),
            history_capacity: defaults::HISTORY_CAPACITY,
            error_backoff_ms: defaults::ERROR_BACKOFF_MS,
            process_existing: false,
        }
    }
}

impl WatchConfig {
    /// Stability timeout as a `Duration`, falling back to the default for invalid values.
    #[must_use]
    pub fn stability_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.stability_timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(defaults::STABILITY_TIMEOUT_SECS))
    }

    /// Requested stability poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pause applied after an unexpected worker error.
    #[must_use]
    pub const fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Interface the API binds to.
    pub bind_addr: IpAddr,
    /// TCP port the API binds to.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from(defaults::HTTP_BIND_ADDR),
            port: defaults::HTTP_PORT,
        }
    }
}

impl HttpConfig {
    /// Socket address assembled from the bind address and port.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// `json` or `pretty`; inferred from the build profile when absent.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// Partial update to [`WatchConfig`] submitted through the control API.
///
/// Absent fields keep their current value. `stability_wait_seconds` and
/// `dry_run_mode` are accepted as aliases for older clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfigPatch {
    /// Replacement workplace directory.
    pub workplace_path: Option<PathBuf>,
    /// Replacement destination root.
    pub destination_root: Option<PathBuf>,
    /// Replacement stability timeout, in seconds.
    #[serde(alias = "stability_wait_seconds")]
    pub stability_timeout_secs: Option<f64>,
    /// Replacement poll interval, in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Replacement dry-run flag.
    #[serde(alias = "dry_run_mode")]
    pub dry_run: Option<bool>,
    /// Replacement status keywords.
    pub status_keywords: Option<Vec<String>>,
    /// Replacement filename pattern.
    pub filename_pattern: Option<String>,
    /// Replacement history capacity.
    pub history_capacity: Option<usize>,
    /// Replacement error backoff, in milliseconds.
    pub error_backoff_ms: Option<u64>,
    /// Replacement scan-on-start flag.
    pub process_existing: Option<bool>,
}

impl WatchConfigPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Names of the fields this patch sets, in declaration order.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("workplace_path", self.workplace_path.is_some()),
            ("destination_root", self.destination_root.is_some()),
            ("stability_timeout_secs", self.stability_timeout_secs.is_some()),
            ("poll_interval_ms", self.poll_interval_ms.is_some()),
            ("dry_run", self.dry_run.is_some()),
            ("status_keywords", self.status_keywords.is_some()),
            ("filename_pattern", self.filename_pattern.is_some()),
            ("history_capacity", self.history_capacity.is_some()),
            ("error_backoff_ms", self.error_backoff_ms.is_some()),
            ("process_existing", self.process_existing.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    /// Produce a validated copy of `base` with this patch applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged configuration fails validation.
    pub fn apply_to(&self, base: &WatchConfig) -> ConfigResult<WatchConfig> {
        let mut next = base.clone();
        if let Some(path) = &self.workplace_path {
            next.workplace_path.clone_from(path);
        }
        if let Some(path) = &self.destination_root {
            next.destination_root.clone_from(path);
        }
        if let Some(secs) = self.stability_timeout_secs {
            next.stability_timeout_secs = secs;
        }
        if let Some(ms) = self.poll_interval_ms {
            next.poll_interval_ms = ms;
        }
        if let Some(flag) = self.dry_run {
            next.dry_run = flag;
        }
        if let Some(keywords) = &self.status_keywords {
            next.status_keywords = normalize_keywords(keywords);
        }
        if let Some(pattern) = &self.filename_pattern {
            next.filename_pattern.clone_from(pattern);
        }
        if let Some(capacity) = self.history_capacity {
            next.history_capacity = capacity;
        }
        if let Some(ms) = self.error_backoff_ms {
            next.error_backoff_ms = ms;
        }
        if let Some(flag) = self.process_existing {
            next.process_existing = flag;
        }
        validate_watch_config(&next)?;
        Ok(next)
    }
}
