//! Layered configuration loader: defaults, then an optional YAML file, then
//! `SIGNET_*` environment overrides.
//!
//! # Design
//! - Environment access goes through an injectable lookup so tests never mutate
//!   process state.
//! - The merged document is validated once, after every layer is applied.
//! - Flags are parsed strictly; a typo is an error instead of a silent `false`.

use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::SignetConfig;
use crate::validate::{normalize_keywords, validate_config};

/// Environment variable naming the YAML configuration file.
pub const CONFIG_PATH_ENV: &str = "SIGNET_CONFIG";
/// File consulted in the working directory when `SIGNET_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "signet.yaml";

const ENV_WORKPLACE: &str = "SIGNET_WORKPLACE";
const ENV_DESTINATION: &str = "SIGNET_DESTINATION";
const ENV_STABILITY_TIMEOUT: &str = "SIGNET_STABILITY_TIMEOUT_SECS";
const ENV_POLL_INTERVAL: &str = "SIGNET_POLL_INTERVAL_MS";
const ENV_DRY_RUN: &str = "SIGNET_DRY_RUN";
const ENV_STATUS_KEYWORDS: &str = "SIGNET_STATUS_KEYWORDS";
const ENV_FILENAME_PATTERN: &str = "SIGNET_FILENAME_PATTERN";
const ENV_HTTP_BIND: &str = "SIGNET_HTTP_BIND";
const ENV_HTTP_PORT: &str = "SIGNET_HTTP_PORT";
const ENV_LOG_LEVEL: &str = "SIGNET_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "SIGNET_LOG_FORMAT";
const ENV_AUTO_START: &str = "SIGNET_AUTO_START";
const ENV_PROCESS_EXISTING: &str = "SIGNET_PROCESS_EXISTING";

/// Loads a [`SignetConfig`] from a YAML file and environment overrides.
pub struct ConfigLoader<F> {
    lookup: F,
    default_file: PathBuf,
}

impl ConfigLoader<fn(&str) -> Option<String>> {
    /// Loader backed by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_lookup(process_env as fn(&str) -> Option<String>)
    }
}

impl<F> ConfigLoader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Loader backed by an arbitrary variable lookup.
    pub fn with_lookup(lookup: F) -> Self {
        Self {
            lookup,
            default_file: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Override the file consulted when `SIGNET_CONFIG` is unset.
    #[must_use]
    pub fn with_default_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_file = path.into();
        self
    }

    /// Resolve, merge, and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the named file cannot be read or parsed, when an
    /// environment override is malformed, or when the merged document fails
    /// validation.
    pub fn load(&self) -> ConfigResult<SignetConfig> {
        let mut config = match self.config_file() {
            Some(path) => read_file(&path)?,
            None => SignetConfig::default(),
        };
        self.apply_env(&mut config)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn config_file(&self) -> Option<PathBuf> {
        if let Some(explicit) = self.var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }
        self.default_file
            .is_file()
            .then(|| self.default_file.clone())
    }

    fn apply_env(&self, config: &mut SignetConfig) -> ConfigResult<()> {
        if let Some(path) = self.var(ENV_WORKPLACE) {
            config.watch.workplace_path = PathBuf::from(path);
        }
        if let Some(path) = self.var(ENV_DESTINATION) {
            config.watch.destination_root = PathBuf::from(path);
        }
        if let Some(value) = self.var(ENV_STABILITY_TIMEOUT) {
            config.watch.stability_timeout_secs = parse_number(ENV_STABILITY_TIMEOUT, value)?;
        }
        if let Some(value) = self.var(ENV_POLL_INTERVAL) {
            config.watch.poll_interval_ms = parse_number(ENV_POLL_INTERVAL, value)?;
        }
        if let Some(value) = self.var(ENV_DRY_RUN) {
            config.watch.dry_run = parse_flag(ENV_DRY_RUN, value)?;
        }
        if let Some(value) = self.var(ENV_STATUS_KEYWORDS) {
            let keywords: Vec<String> = value.split(',').map(str::to_string).collect();
            config.watch.status_keywords = normalize_keywords(&keywords);
        }
        if let Some(pattern) = self.var(ENV_FILENAME_PATTERN) {
            config.watch.filename_pattern = pattern;
        }
        if let Some(value) = self.var(ENV_PROCESS_EXISTING) {
            config.watch.process_existing = parse_flag(ENV_PROCESS_EXISTING, value)?;
        }
        if let Some(value) = self.var(ENV_HTTP_BIND) {
            config.http.bind_addr = parse_number::<IpAddr>(ENV_HTTP_BIND, value)?;
        }
        if let Some(value) = self.var(ENV_HTTP_PORT) {
            config.http.port = parse_number(ENV_HTTP_PORT, value)?;
        }
        if let Some(level) = self.var(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }
        if let Some(format) = self.var(ENV_LOG_FORMAT) {
            config.logging.format = Some(format);
        }
        if let Some(value) = self.var(ENV_AUTO_START) {
            config.auto_start = parse_flag(ENV_AUTO_START, value)?;
        }
        Ok(())
    }

    fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn read_file(path: &Path) -> ConfigResult<SignetConfig> {
    debug!(path = %path.display(), "loading configuration file");
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(SignetConfig::default());
    }
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_flag(name: &'static str, value: String) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value,
            reason: "not_a_flag",
        }),
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: String) -> ConfigResult<T> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value,
        reason: "unparseable",
    })
}

/// Whether `err` means the configuration file was simply absent.
#[must_use]
pub fn is_missing_file(err: &ConfigError) -> bool {
    matches!(err, ConfigError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn loader(vars: &[(&str, &str)]) -> ConfigLoader<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        ConfigLoader::with_lookup(move |name: &str| vars.get(name).cloned())
            .with_default_file("/nonexistent/signet.yaml")
    }

    #[test]
    fn defaults_when_nothing_is_set() -> ConfigResult<()> {
        let config = loader(&[]).load()?;
        assert_eq!(config, SignetConfig::default());
        Ok(())
    }

    #[test]
    fn env_overrides_apply() -> ConfigResult<()> {
        let config = loader(&[
            (ENV_WORKPLACE, "/srv/in"),
            (ENV_DESTINATION, "/srv/out"),
            (ENV_STABILITY_TIMEOUT, "2.5"),
            (ENV_DRY_RUN, "YES"),
            (ENV_STATUS_KEYWORDS, "Signed, countersigned ,"),
            (ENV_HTTP_PORT, "9090"),
            (ENV_AUTO_START, "off"),
        ])
        .load()?;
        assert_eq!(config.watch.workplace_path, PathBuf::from("/srv/in"));
        assert_eq!(config.watch.destination_root, PathBuf::from("/srv/out"));
        assert!((config.watch.stability_timeout_secs - 2.5).abs() < f64::EPSILON);
        assert!(config.watch.dry_run);
        assert_eq!(config.watch.status_keywords, vec!["signed", "countersigned"]);
        assert_eq!(config.http.port, 9090);
        assert!(!config.auto_start);
        Ok(())
    }

    #[test]
    fn malformed_flag_is_rejected() {
        let err = loader(&[(ENV_DRY_RUN, "maybe")]).load();
        assert!(matches!(
            err,
            Err(ConfigError::InvalidEnv {
                name: ENV_DRY_RUN,
                reason: "not_a_flag",
                ..
            })
        ));
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = loader(&[(ENV_HTTP_PORT, "eighty")]).load();
        assert!(matches!(
            err,
            Err(ConfigError::InvalidEnv {
                name: ENV_HTTP_PORT,
                ..
            })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_io_error() {
        let err = loader(&[(CONFIG_PATH_ENV, "/nonexistent/explicit.yaml")]).load();
        assert!(err.as_ref().is_err_and(is_missing_file));
    }

    #[test]
    fn blank_values_are_ignored() -> ConfigResult<()> {
        let config = loader(&[(ENV_HTTP_PORT, "  ")]).load()?;
        assert_eq!(config.http.port, crate::defaults::HTTP_PORT);
        Ok(())
    }
}
