use crate::config::RunConfig;
use crate::dispatch::Dispatcher;
use crate::payload::build_batch;
use crate::sink::ResultSink;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Per-worker pause between dispatches: `1/rate` seconds, or none at all
/// when the rate is zero or negative (maximum throughput).
pub fn send_interval(rps: f64) -> Duration {
    if rps > 0.0 {
        Duration::from_secs_f64(1.0 / rps)
    } else {
        Duration::ZERO
    }
}

/// One independent dispatch loop.
///
/// Workers know nothing about each other; the aggregate request rate is
/// simply `workers x rps`. The cancellation token is consulted only at
/// iteration boundaries, so an in-flight dispatch or record is always
/// carried to completion before the worker stops.
pub struct Worker {
    id: usize,
    batch_size: usize,
    interval: Duration,
    dispatcher: Arc<Dispatcher>,
    sink: ResultSink,
    token: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        config: &RunConfig,
        dispatcher: Arc<Dispatcher>,
        sink: ResultSink,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            batch_size: config.batch_size,
            interval: send_interval(config.rps),
            dispatcher,
            sink,
            token,
        }
    }

    /// Runs until cancelled. Returns `Err` only when an outcome cannot be
    /// persisted, which is fatal for this worker.
    pub async fn run(self) -> Result<()> {
        let mut rng = StdRng::from_os_rng();

        while !self.token.is_cancelled() {
            let batch = build_batch(&mut rng, self.batch_size);
            let outcome = self.dispatcher.dispatch(&batch).await;

            match outcome.status_code {
                Some(status) => info!(
                    "worker {}: batch of {} events, status {}, {}ms",
                    self.id, outcome.batch_size, status, outcome.duration_ms
                ),
                None => warn!(
                    "worker {}: dispatch failed after {}ms: {}",
                    self.id,
                    outcome.duration_ms,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
            }

            self.sink
                .record(outcome)
                .await
                .with_context(|| format!("worker {} cannot persist outcomes", self.id))?;

            if !self.interval.is_zero() {
                // The pause may be cut short by cancellation; the loop
                // condition then stops the worker cleanly.
                tokio::select! {
                    () = sleep(self.interval) => {}
                    () = self.token.cancelled() => {}
                }
            }
        }

        info!("worker {}: stopped", self.id);
        Ok(())
    }
}
