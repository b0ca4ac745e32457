use crate::config::RunConfig;
use crate::dispatch::Dispatcher;
use crate::sink::ResultSink;
use crate::worker::Worker;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs the whole load test: truncate the results file, spawn the workers,
/// stop them on the first interrupt, and return once every in-flight
/// dispatch has been logged.
///
/// A second interrupt during shutdown is deliberately not handled; the
/// default signal disposition then kills the process.
pub async fn run(config: RunConfig) -> Result<()> {
    let token = CancellationToken::new();

    let interrupt = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, waiting for in-flight requests to finish");
                token.cancel();
            }
        })
    };

    let result = run_with_token(config, token).await;
    interrupt.abort();
    result
}

/// Same as [`run`] but with an externally owned cancellation token, which
/// is what the tests drive.
pub async fn run_with_token(config: RunConfig, token: CancellationToken) -> Result<()> {
    let (sink, writer) = ResultSink::spawn(&config.log_file).await?;
    let dispatcher = Arc::new(Dispatcher::new(&config)?);

    info!(
        "starting {} workers at {} req/s each against {}",
        config.workers, config.rps, config.url
    );

    let mut handles = Vec::with_capacity(config.workers);
    for id in 0..config.workers {
        let worker = Worker::new(
            id,
            &config,
            Arc::clone(&dispatcher),
            sink.clone(),
            token.clone(),
        );
        handles.push(tokio::spawn(worker.run()));
    }

    // A worker that stops on its own hit a fatal persistence error; it is
    // reported but not restarted.
    for (id, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("worker {id} terminated abnormally: {e:#}"),
            Err(e) => error!("worker {id} panicked: {e}"),
        }
    }

    // All producers are gone; let the writer drain the queue and close.
    drop(sink);
    writer.await.context("result writer task failed")?
}
