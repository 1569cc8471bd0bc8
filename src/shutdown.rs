use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// A trait for sources that can trigger a graceful shutdown of the server.
#[async_trait]
pub trait Shutdown: Send + Sync {
    /// This future resolves when a shutdown signal is received.
    async fn wait_for_signal(&mut self);
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it.
#[derive(Debug, Default)]
pub struct CtrlCShutdown;

impl CtrlCShutdown {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Shutdown for CtrlCShutdown {
    async fn wait_for_signal(&mut self) {
        let ctrl_c = async {
            let _ = tokio::signal::ctrl_c().await;
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(_) => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Ctrl-C received, initiating graceful shutdown"),
            _ = terminate => info!("SIGTERM received, initiating graceful shutdown"),
        }
    }
}

/// Resolves once a fixed duration has elapsed.
pub struct TimeBasedShutdown {
    duration: Duration,
}

impl TimeBasedShutdown {
    /// Creates a new handler that will trigger a shutdown after the given duration.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Shutdown for TimeBasedShutdown {
    async fn wait_for_signal(&mut self) {
        info!(
            duration_ms = self.duration.as_millis() as u64,
            "Server shutdown scheduled"
        );
        tokio::time::sleep(self.duration).await;
        info!(
            duration_ms = self.duration.as_millis() as u64,
            "Time-based shutdown triggered"
        );
    }
}
