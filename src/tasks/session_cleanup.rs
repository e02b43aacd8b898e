use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::session::SessionStore;

/// Background task that sweeps expired sessions
pub struct SessionCleanupTask {
    config: SessionConfig,
    sessions: Arc<dyn SessionStore>,
    shutdown: broadcast::Receiver<()>,
}

impl SessionCleanupTask {
    pub fn new(
        config: SessionConfig,
        sessions: Arc<dyn SessionStore>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            sessions,
            shutdown,
        }
    }

    /// Run until the shutdown signal fires
    pub async fn run(mut self) {
        let interval = Duration::from_secs(self.config.cleanup_interval.max(1));
        let mut cleanup_timer = tokio::time::interval(interval);

        // Skip immediate first tick
        cleanup_timer.tick().await;

        tracing::info!(
            cleanup_interval_secs = self.config.cleanup_interval,
            session_lifetime_secs = self.config.lifetime_seconds,
            "Session cleanup task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Session cleanup task received shutdown signal");
                    break;
                }
                _ = cleanup_timer.tick() => {
                    self.sweep().await;
                }
            }
        }

        tracing::info!("Session cleanup task stopped");
    }

    async fn sweep(&self) {
        let start = Instant::now();
        match self.sessions.remove_expired().await {
            Ok(0) => {}
            Ok(removed) => {
                tracing::debug!(
                    removed = removed,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Expired sessions removed"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session cleanup failed");
            }
        }
    }
}
