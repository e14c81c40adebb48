//! Self-ping keep-alive task.
//!
//! Free-tier hosts put idle processes to sleep. When a self URL is
//! configured, this task pings the proxy's own `/keep-alive` route on a
//! fixed interval until shutdown.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use url::Url;

/// Periodically pings the proxy's public URL.
pub struct SelfPinger {
    url: Url,
    interval: Duration,
    client: reqwest::Client,
}

impl SelfPinger {
    pub fn new(url: Url, interval: Duration) -> Self {
        Self {
            url,
            interval,
            client: reqwest::Client::new(),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            url = %self.url,
            interval_secs = self.interval.as_secs(),
            "Keep-alive pinger starting"
        );

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.ping().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Keep-alive pinger received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn ping(&self) {
        let target = match self.url.join("/keep-alive") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Unusable self URL, skipping ping");
                return;
            }
        };

        match self.client.get(target).send().await {
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Self-ping completed");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Self-ping failed");
            }
        }
    }
}
