//! Shared HTTP constants (headers, problem URIs, pagination defaults).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const HEADER_LAST_EVENT_ID: &str = "last-event-id";
pub(crate) const SSE_KEEP_ALIVE_SECS: u64 = 20;

pub(crate) const PROBLEM_INTERNAL: &str = "https://signet.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://signet.dev/problems/bad-request";
pub(crate) const PROBLEM_CONFLICT: &str = "https://signet.dev/problems/conflict";
pub(crate) const PROBLEM_CONFIG_INVALID: &str = "https://signet.dev/problems/config-invalid";

pub(crate) const DEFAULT_FILES_LIMIT: usize = 50;
pub(crate) const DEFAULT_LOGS_LIMIT: usize = 100;
pub(crate) const MAX_LOGS_LIMIT: usize = 1000;
pub(crate) const EVENT_KIND_WHITELIST: &[&str] = &[
    "file_queued",
    "file_outcome",
    "watcher_state_changed",
    "config_staged",
    "health_changed",
];
