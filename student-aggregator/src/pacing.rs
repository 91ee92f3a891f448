use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Blocking waits between remote calls. Backoff sleeps, per-source pacing and
/// the aggregator's inter-source delay all go through this.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        debug!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays without waiting. Used for offline runs and tests.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn pauses_secs(&self) -> Vec<u64> {
        self.pauses().iter().map(Duration::as_secs).collect()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(delay);
        }
    }
}
