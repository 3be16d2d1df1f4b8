//! Validation helpers and normalisation utilities for configuration documents.

use regex::RegexBuilder;

use crate::defaults::REQUIRED_PATTERN_GROUPS;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{SignetConfig, WatchConfig};

const MAX_STABILITY_TIMEOUT_SECS: f64 = 3_600.0;
const POLL_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=60_000;
const HISTORY_CAPACITY_RANGE: std::ops::RangeInclusive<usize> = 100..=200;
const MAX_ERROR_BACKOFF_MS: u64 = 60_000;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate the full configuration document.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate_config(config: &SignetConfig) -> ConfigResult<()> {
    validate_watch_config(&config.watch)?;

    if config.http.port == 0 {
        return Err(ConfigError::invalid(
            "http",
            "port",
            "zero",
            Some(config.http.port.to_string()),
        ));
    }

    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::invalid(
            "logging",
            "level",
            "unknown_level",
            Some(config.logging.level.clone()),
        ));
    }
    if let Some(format) = config.logging.format.as_deref() {
        let format = format.trim();
        if !format.eq_ignore_ascii_case("json") && !format.eq_ignore_ascii_case("pretty") {
            return Err(ConfigError::invalid(
                "logging",
                "format",
                "unknown_format",
                Some(format.to_string()),
            ));
        }
    }
    Ok(())
}

/// Validate the watcher settings.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate_watch_config(watch: &WatchConfig) -> ConfigResult<()> {
    if watch.workplace_path.as_os_str().is_empty() {
        return Err(ConfigError::invalid("watch", "workplace_path", "empty", None));
    }
    if watch.destination_root.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            "watch",
            "destination_root",
            "empty",
            None,
        ));
    }
    if watch.destination_root == watch.workplace_path {
        return Err(ConfigError::invalid(
            "watch",
            "destination_root",
            "same_as_workplace",
            Some(watch.destination_root.display().to_string()),
        ));
    }

    let timeout = watch.stability_timeout_secs;
    if !timeout.is_finite() || timeout <= 0.0 || timeout > MAX_STABILITY_TIMEOUT_SECS {
        return Err(ConfigError::invalid(
            "watch",
            "stability_timeout_secs",
            "out_of_range",
            Some(timeout.to_string()),
        ));
    }
    if !POLL_INTERVAL_RANGE_MS.contains(&watch.poll_interval_ms) {
        return Err(ConfigError::invalid(
            "watch",
            "poll_interval_ms",
            "out_of_range",
            Some(watch.poll_interval_ms.to_string()),
        ));
    }
    if !HISTORY_CAPACITY_RANGE.contains(&watch.history_capacity) {
        return Err(ConfigError::invalid(
            "watch",
            "history_capacity",
            "out_of_range",
            Some(watch.history_capacity.to_string()),
        ));
    }
    if watch.error_backoff_ms > MAX_ERROR_BACKOFF_MS {
        return Err(ConfigError::invalid(
            "watch",
            "error_backoff_ms",
            "out_of_range",
            Some(watch.error_backoff_ms.to_string()),
        ));
    }
    if watch.status_keywords.iter().all(|keyword| keyword.trim().is_empty()) {
        return Err(ConfigError::invalid(
            "watch",
            "status_keywords",
            "empty",
            None,
        ));
    }
    validate_filename_pattern(&watch.filename_pattern)
}

/// Check that `pattern` compiles and defines every required capture group.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] with reason `invalid_regex` or
/// `missing_group`.
pub fn validate_filename_pattern(pattern: &str) -> ConfigResult<()> {
    let compiled = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|_| {
            ConfigError::invalid(
                "watch",
                "filename_pattern",
                "invalid_regex",
                Some(pattern.to_string()),
            )
        })?;
    let names: Vec<&str> = compiled.capture_names().flatten().collect();
    if REQUIRED_PATTERN_GROUPS
        .iter()
        .any(|group| !names.contains(group))
    {
        return Err(ConfigError::invalid(
            "watch",
            "filename_pattern",
            "missing_group",
            Some(pattern.to_string()),
        ));
    }
    Ok(())
}

/// Trim, lowercase, and drop empty keywords.
#[must_use]
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reason_of(result: ConfigResult<()>) -> Option<(&'static str, &'static str)> {
        match result {
            Err(ConfigError::InvalidField { field, reason, .. }) => Some((field, reason)),
            _ => None,
        }
    }

    #[test]
    fn rejects_destination_equal_to_workplace() {
        let watch = WatchConfig {
            workplace_path: PathBuf::from("/data/in"),
            destination_root: PathBuf::from("/data/in"),
            ..WatchConfig::default()
        };
        assert_eq!(
            reason_of(validate_watch_config(&watch)),
            Some(("destination_root", "same_as_workplace"))
        );
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let watch = WatchConfig {
            poll_interval_ms: 0,
            ..WatchConfig::default()
        };
        assert_eq!(
            reason_of(validate_watch_config(&watch)),
            Some(("poll_interval_ms", "out_of_range"))
        );

        let watch = WatchConfig {
            history_capacity: 500,
            ..WatchConfig::default()
        };
        assert_eq!(
            reason_of(validate_watch_config(&watch)),
            Some(("history_capacity", "out_of_range"))
        );

        let watch = WatchConfig {
            stability_timeout_secs: f64::NAN,
            ..WatchConfig::default()
        };
        assert_eq!(
            reason_of(validate_watch_config(&watch)),
            Some(("stability_timeout_secs", "out_of_range"))
        );
    }

    #[test]
    fn filename_pattern_requires_named_groups() {
        assert_eq!(
            reason_of(validate_filename_pattern(r"^(?P<doc>.+)\.pdf$")),
            Some(("filename_pattern", "missing_group"))
        );
        assert_eq!(
            reason_of(validate_filename_pattern("(unclosed")),
            Some(("filename_pattern", "invalid_regex"))
        );
        assert!(validate_filename_pattern(crate::defaults::FILENAME_PATTERN).is_ok());
    }

    #[test]
    fn rejects_blank_keywords_and_unknown_log_level() {
        let watch = WatchConfig {
            status_keywords: vec![" ".to_string()],
            ..WatchConfig::default()
        };
        assert_eq!(
            reason_of(validate_watch_config(&watch)),
            Some(("status_keywords", "empty"))
        );

        let mut config = SignetConfig::default();
        config.logging.level = "loud".to_string();
        assert_eq!(
            reason_of(validate_config(&config)),
            Some(("level", "unknown_level"))
        );
    }

    #[test]
    fn normalize_keywords_trims_and_lowercases() {
        let keywords = vec![" Executed".to_string(), String::new(), "FINAL ".to_string()];
        assert_eq!(normalize_keywords(&keywords), vec!["executed", "final"]);
    }
}
