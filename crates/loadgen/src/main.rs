use anyhow::{Context, Result};
use clap::Parser;
use loadgen_core::{pool, RunConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "loadgen")]
#[command(about = "Load generator for an event-ingestion HTTP endpoint")]
struct Args {
    /// Path to a TOML configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Endpoint URL (required unless provided by --config)
    #[arg(long)]
    url: Option<String>,

    /// API key sent as the x-api-key header
    #[arg(long)]
    api_key: Option<String>,

    /// Events per request
    #[arg(long)]
    batch_size: Option<usize>,

    /// Requests per second, per worker
    #[arg(long)]
    rps: Option<f64>,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Results file (JSON lines)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Per-request timeout in milliseconds (unbounded when omitted)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Args {
    fn resolve(self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => {
                let url = self
                    .url
                    .clone()
                    .context("--url is required when no --config file is given")?;
                RunConfig::new(url)
            }
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(rps) = self.rps {
            config.rps = rps;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = Some(timeout_ms);
        }

        Ok(config)
    }
}

fn print_run_banner(config: &RunConfig) {
    println!("\n{}", "=".repeat(60));
    println!("LOAD TEST - EVENT TRACKING API");
    println!("{}", "=".repeat(60));
    println!("Endpoint: {}", config.url);
    println!("Batch size: {} events", config.batch_size);
    println!("Workers: {}", config.workers);
    println!(
        "Request rate: {:.2} req/s total",
        config.rps * config.workers as f64
    );
    println!(
        "Event rate: {:.2} events/s",
        config.rps * config.workers as f64 * config.batch_size as f64
    );
    println!("Results file: {}", config.log_file.display());
    println!("{}", "=".repeat(60));
    println!("Press Ctrl+C to stop the test\n");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().resolve()?;

    // The core treats the results path as ready to use.
    if let Some(dir) = config.log_file.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        }
    }

    print_run_banner(&config);

    pool::run(config.clone()).await?;

    info!("load test finished");
    println!("\nTest finished.");
    println!("Results saved to {}", config.log_file.display());

    Ok(())
}
