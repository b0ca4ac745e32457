use crate::dispatch::DispatchOutcome;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::error;

const CHANNEL_CAPACITY: usize = 1024;

/// Handle to the single-writer results file.
///
/// All workers funnel their outcomes through one mpsc channel into one
/// writer task, so each JSON line lands in the file whole no matter how
/// many workers report at once. Cloning the handle shares the channel.
#[derive(Clone)]
pub struct ResultSink {
    tx: mpsc::Sender<DispatchOutcome>,
}

impl ResultSink {
    /// Truncates the results file and starts the writer task. The caller
    /// keeps the `JoinHandle` to collect the writer's final result once
    /// every handle has been dropped.
    pub async fn spawn(path: impl AsRef<Path>) -> Result<(Self, JoinHandle<Result<()>>)> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .with_context(|| format!("create results file {}", path.display()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(write_loop(file, rx, path));

        Ok((Self { tx }, handle))
    }

    /// Queues one outcome for appending. Fails only when the writer task
    /// has died (disk full, permission lost), which the caller must treat
    /// as fatal: looping on against a broken results file would silently
    /// discard test data.
    pub async fn record(&self, outcome: DispatchOutcome) -> Result<()> {
        self.tx
            .send(outcome)
            .await
            .map_err(|_| anyhow!("result sink is closed"))
    }
}

async fn write_loop(
    mut file: File,
    mut rx: mpsc::Receiver<DispatchOutcome>,
    path: PathBuf,
) -> Result<()> {
    while let Some(outcome) = rx.recv().await {
        let mut line = serde_json::to_string(&outcome)?;
        line.push('\n');

        // Flush per line so completed records survive process exit.
        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            error!("cannot append to {}: {e}", path.display());
            return Err(e).with_context(|| format!("append to {}", path.display()));
        }
    }
    Ok(())
}
