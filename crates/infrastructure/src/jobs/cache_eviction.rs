use crate::dns::cache::ResponseCache;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Background sweep dropping expired cache records once per second. Runs
/// until the shutdown token fires.
pub struct CacheEvictionJob {
    cache: Arc<ResponseCache>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl CacheEvictionJob {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self {
            cache,
            interval: DEFAULT_SWEEP_INTERVAL,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("cache eviction job: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let evicted = self.cache.evict_expired();
                        if evicted > 0 {
                            debug!(evicted, "evicted expired cache records");
                        }
                    }
                }
            }
        })
    }
}
