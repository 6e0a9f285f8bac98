//! Log Producer CLI - pushes synthetic log events to a running Logvault server.
//!
//! Usage:
//!   log_producer --target http://127.0.0.1:8080 --rate 200
//!   log_producer --target http://127.0.0.1:8080 --rate 0 --batch-size 500 --duration-secs 30

use clap::Parser;
use logvault::{
    core::LogEvent,
    http::IngestResponse,
    logging,
    producer::synthetic_event,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "log_producer")]
#[command(about = "Synthetic load generator for the Logvault HTTP API")]
struct Args {
    /// Base URL of the Logvault server
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    target: String,

    /// Events per second (0 = unlimited)
    #[arg(short, long, default_value = "100")]
    rate: u64,

    /// Events per request
    #[arg(short, long, default_value = "50")]
    batch_size: usize,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(long)]
    duration_secs: Option<u64>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> logvault::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let should_stop = Arc::new(AtomicBool::new(false));
    let stop_clone = Arc::clone(&should_stop);
    ctrlc::set_handler(move || {
        stop_clone.store(true, Ordering::Relaxed);
    })
    .map_err(|e| logvault::Error::Config(format!("Failed to install Ctrl-C handler: {}", e)))?;

    let client = reqwest::Client::new();
    let url = format!("{}/api/v1/logs/batch", args.target.trim_end_matches('/'));
    let batch_size = args.batch_size.max(1);
    let batch_pause = if args.rate == 0 {
        Duration::ZERO
    } else {
        Duration::from_secs_f64(batch_size as f64 / args.rate as f64)
    };
    let deadline = args.duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));

    info!(%url, rate = args.rate, batch_size, "Log producer started");

    let start = Instant::now();
    let mut events_sent: u64 = 0;
    let mut send_errors: u64 = 0;
    let mut rng = rand::thread_rng();

    while !should_stop.load(Ordering::Relaxed) && deadline.map_or(true, |d| Instant::now() < d) {
        let batch: Vec<LogEvent> = (0..batch_size).map(|_| synthetic_event(&mut rng)).collect();

        match send_batch(&client, &url, &batch).await {
            Ok(accepted) => events_sent += accepted as u64,
            Err(e) => {
                send_errors += 1;
                warn!("Failed to send batch: {}", e);
            }
        }

        if !batch_pause.is_zero() {
            tokio::time::sleep(batch_pause).await;
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    info!(
        events_sent,
        send_errors,
        elapsed_seconds = elapsed,
        events_per_second = if elapsed > 0.0 { events_sent as f64 / elapsed } else { 0.0 },
        "Log producer finished"
    );

    Ok(())
}

async fn send_batch(
    client: &reqwest::Client,
    url: &str,
    batch: &[LogEvent],
) -> logvault::Result<usize> {
    let response: IngestResponse =
        client.post(url).json(batch).send().await?.error_for_status()?.json().await?;
    Ok(response.accepted)
}
