use std::future::Future;

use crate::error::{AppError, AppResult};
use signet_api::ApiServer;
use signet_config::{ConfigLoader, SignetConfig};
use signet_events::EventBus;
use signet_pipeline::{PipelineError, WatchService};
use signet_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, Metrics};
use tracing::{error, info, warn};

/// Build identifier recorded in logs; injected at compile time when available.
const BUILD_SHA: &str = match option_env!("SIGNET_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Dependencies required to bootstrap the Signet application.
pub struct BootstrapDependencies {
    config: SignetConfig,
    events: EventBus,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Construct production dependencies from the configuration file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be loaded or validated, or
    /// when the metrics registry cannot be built.
    pub fn from_env() -> AppResult<Self> {
        let config = ConfigLoader::from_env()
            .load()
            .map_err(|err| AppError::config("config.load", err))?;
        Self::from_config(config)
    }

    /// Construct dependencies around an already-loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the metrics registry cannot be built.
    pub fn from_config(config: SignetConfig) -> AppResult<Self> {
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            events: EventBus::new(),
            telemetry,
        })
    }

    /// Loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &SignetConfig {
        &self.config
    }
}

/// Entry point for the Signet boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the API listener fail.
pub async fn run_app() -> AppResult<()> {
    let dependencies = BootstrapDependencies::from_env()?;
    let logging = &dependencies.config.logging;
    signet_telemetry::init_logging(&LoggingConfig {
        level: &logging.level,
        format: LogFormat::from_label(logging.format.as_deref()),
        build_sha: BUILD_SHA,
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    Box::pin(run_app_with(dependencies, shutdown_signal())).await
}

/// Boot sequence driven by injected dependencies and an explicit shutdown future.
///
/// A failed auto-start leaves the watcher in the `error` state but keeps the
/// API up so operators can inspect and retry.
///
/// # Errors
///
/// Returns an error if the API listener cannot bind or terminates unexpectedly,
/// or if the watcher cannot be stopped during shutdown.
pub async fn run_app_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let _context = GlobalContextGuard::new("watcher");
    info!("Signet bootstrap starting");

    let BootstrapDependencies {
        config,
        events,
        telemetry,
    } = dependencies;

    let service = WatchService::new(config.watch.clone(), events, telemetry);
    info!(
        workplace = %config.watch.workplace_path.display(),
        destination = %config.watch.destination_root.display(),
        dry_run = config.watch.dry_run,
        "watch service configured"
    );

    if config.auto_start
        && let Err(err) = service.start().await
    {
        error!(error = %err, detail = %err.detail(), "watcher auto-start failed");
    }

    let addr = config.http.socket_addr();
    info!(addr = %addr, "Launching API listener");
    let serve_result = ApiServer::new(service.clone()).serve(addr, shutdown).await;

    match service.stop().await {
        Ok(()) | Err(PipelineError::NotRunning) => {}
        Err(err) => {
            warn!(error = %err, "watcher did not stop cleanly");
            serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
            return Err(AppError::pipeline("service.stop", err));
        }
    }

    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                let _ = stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("received interrupt; shutting down"),
        () = terminate => info!("received SIGTERM; shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};
    use std::time::Duration;

    use signet_test_support::WatchFixture;

    fn loopback_config(fixture: &WatchFixture, port: u16) -> SignetConfig {
        let mut config = SignetConfig {
            watch: fixture.watch_config(),
            ..SignetConfig::default()
        };
        config.http.bind_addr = Ipv4Addr::LOCALHOST.into();
        config.http.port = port;
        config
    }

    #[tokio::test]
    async fn run_app_with_auto_start_serves_until_shutdown() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        std::fs::remove_dir_all(fixture.workplace())?;
        let mut config = loopback_config(&fixture, 0);
        config.auto_start = true;

        let dependencies = BootstrapDependencies::from_config(config)?;
        run_app_with(dependencies, tokio::time::sleep(Duration::from_millis(200))).await?;
        assert!(fixture.workplace().is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn failed_auto_start_keeps_serving() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let blocker = fixture.root().join("blocker");
        std::fs::write(&blocker, b"file")?;
        let mut config = loopback_config(&fixture, 0);
        config.watch.workplace_path = blocker.join("inbox");
        config.auto_start = true;

        let dependencies = BootstrapDependencies::from_config(config)?;
        run_app_with(dependencies, tokio::time::sleep(Duration::from_millis(100))).await?;
        Ok(())
    }

    #[tokio::test]
    async fn occupied_port_is_reported_as_bind_failure() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let occupied = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let port = occupied.local_addr()?.port();
        let config = loopback_config(&fixture, port);

        let dependencies = BootstrapDependencies::from_config(config)?;
        let result = run_app_with(dependencies, std::future::pending::<()>()).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_server.serve",
                ..
            })
        ));
        Ok(())
    }
}
