//! Failures raised while installing Signet's logging or building and
//! rendering its Prometheus registry.
//!
//! These surface at boot (`signet-app` wraps them with an operation tag)
//! and from `/metrics`, where a render failure becomes a 500 problem.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use prometheus::Error as PrometheusError;

/// Result alias for logging and metrics setup.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Why logging or the watcher's metrics registry could not be set up or rendered.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed, or installing one failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A pipeline or HTTP collector (for example `signet_files_total`) was rejected.
    MetricsCollector {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// A collector name clashed inside the shared registry.
    MetricsRegister {
        /// Metric identifier tied to the failure.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Text exposition for `/metrics` could not be encoded.
    MetricsEncode {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Rendered metrics output was not valid UTF-8.
    MetricsUtf8 {
        /// Underlying UTF-8 conversion error.
        source: std::string::FromUtf8Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { .. } => {
                formatter.write_str("log subscriber could not be installed")
            }
            Self::MetricsCollector { .. } => {
                formatter.write_str("metrics collector could not be built")
            }
            Self::MetricsRegister { .. } => {
                formatter.write_str("metrics collector could not be registered")
            }
            Self::MetricsEncode { .. } => formatter.write_str("metrics exposition could not be encoded"),
            Self::MetricsUtf8 { .. } => formatter.write_str("metrics exposition was not valid utf-8"),
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::MetricsCollector { source, .. }
            | Self::MetricsRegister { source, .. }
            | Self::MetricsEncode { source } => Some(source),
            Self::MetricsUtf8 { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_error_display_and_source() -> std::result::Result<(), Box<dyn Error>> {
        let utf8_error = String::from_utf8(vec![0, 159])
            .err()
            .ok_or_else(|| std::io::Error::other("expected utf8 error"))?;
        let cases = vec![
            (
                TelemetryError::MetricsCollector {
                    name: "metric",
                    source: PrometheusError::Msg("metrics".to_string()),
                },
                "metrics collector could not be built",
            ),
            (
                TelemetryError::MetricsRegister {
                    name: "metric",
                    source: PrometheusError::Msg("metrics".to_string()),
                },
                "metrics collector could not be registered",
            ),
            (
                TelemetryError::MetricsEncode {
                    source: PrometheusError::Msg("metrics".to_string()),
                },
                "metrics exposition could not be encoded",
            ),
            (
                TelemetryError::MetricsUtf8 { source: utf8_error },
                "metrics exposition was not valid utf-8",
            ),
        ];

        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(err.source().is_some());
        }
        Ok(())
    }
}
