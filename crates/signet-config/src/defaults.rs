//! Default values for watcher and service configuration.
//!
//! # Design
//! - Centralize defaults so serde, the loader, and tests agree on one source.

/// Default directory watched for incoming documents.
pub const WORKPLACE_PATH: &str = "./data/workplace";
/// Default root of the classified destination tree.
pub const DESTINATION_ROOT: &str = "./data/destination";
/// Default upper bound on the stability wait, in seconds.
pub const STABILITY_TIMEOUT_SECS: f64 = 10.0;
/// Default stability poll interval, in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 1_000;
/// Default status keywords that mark a document as signed.
pub const STATUS_KEYWORDS: [&str; 3] = ["signed", "executed", "final"];
/// Default filename pattern; must define `doc`, `client`, `date`, and `status` groups.
pub const FILENAME_PATTERN: &str =
    r"^(?P<doc>.+?)_(?P<client>.+?)_(?P<date>\d{4}-?\d{2}-?\d{2})_(?P<status>.+?)\.pdf$";
/// Capture groups every filename pattern must define.
pub const REQUIRED_PATTERN_GROUPS: [&str; 4] = ["doc", "client", "date", "status"];
/// Default number of outcomes retained in the recent history.
pub const HISTORY_CAPACITY: usize = 100;
/// Pause after an unexpected worker error, in milliseconds.
pub const ERROR_BACKOFF_MS: u64 = 1_000;
/// Default HTTP bind address.
pub const HTTP_BIND_ADDR: [u8; 4] = [127, 0, 0, 1];
/// Default HTTP port.
pub const HTTP_PORT: u16 = 8080;
/// Default log level.
pub const LOG_LEVEL: &str = "info";
