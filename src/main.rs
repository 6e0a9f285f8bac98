//! Logvault server binary.
//!
//! Builds one store, starts its retention evictor and (optionally) the
//! in-process synthetic producers, and serves the HTTP API until Ctrl-C.
//!
//! Usage:
//!   cargo run --bin logvault -- --port 8080 --retention-minutes 60 --producer-threads 4

use clap::{Parser, ValueEnum};
use logvault::{
    http::start_server,
    logging,
    producer::{LogProducer, ProducerConfig},
    storage::{EvictionTrigger, LogStore, RetentionConfig, RetentionEvictor, StoreConfig},
    Error,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TriggerArg {
    /// Dedicated timer thread
    Scheduled,
    /// Inline on the write path
    OnWrite,
}

#[derive(Parser, Debug)]
#[command(name = "logvault")]
#[command(about = "In-memory time-indexed log store with an HTTP query API", long_about = None)]
struct Args {
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Events older than this many minutes are evicted
    #[arg(long, default_value = "60")]
    retention_minutes: u64,

    /// Minutes between two retention sweeps
    #[arg(long, default_value = "30")]
    eviction_interval_minutes: u64,

    #[arg(long, value_enum, default_value = "scheduled")]
    eviction_trigger: TriggerArg,

    /// Maintain an unpartitioned index over all events
    #[arg(long)]
    global_index: bool,

    /// Synthetic producer threads (0 disables them)
    #[arg(long, default_value = "4")]
    producer_threads: usize,

    #[arg(long, default_value = "500")]
    producer_interval_ms: u64,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn store_config(&self) -> logvault::Result<StoreConfig> {
        if self.retention_minutes == 0 || self.eviction_interval_minutes == 0 {
            return Err(Error::Config(
                "retention and eviction interval must both be at least one minute".to_string(),
            ));
        }

        Ok(StoreConfig {
            enable_global_index: self.global_index,
            retention: RetentionConfig {
                retention_window: Duration::from_secs(self.retention_minutes * 60),
                eviction_interval: Duration::from_secs(self.eviction_interval_minutes * 60),
                trigger: match self.eviction_trigger {
                    TriggerArg::Scheduled => EvictionTrigger::Scheduled,
                    TriggerArg::OnWrite => EvictionTrigger::OnWrite,
                },
            },
        })
    }
}

#[tokio::main]
async fn main() -> logvault::Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    let config = args.store_config()?;
    info!(
        retention_minutes = args.retention_minutes,
        eviction_interval_minutes = args.eviction_interval_minutes,
        trigger = ?config.retention.trigger,
        global_index = config.enable_global_index,
        "Initializing log store"
    );
    let store = Arc::new(LogStore::with_config(config));

    let mut evictor = (store.config().retention.trigger == EvictionTrigger::Scheduled)
        .then(|| RetentionEvictor::start(Arc::clone(&store)));

    let mut producer = (args.producer_threads > 0).then(|| {
        LogProducer::start(
            Arc::clone(&store),
            &ProducerConfig {
                threads: args.producer_threads,
                interval: Duration::from_millis(args.producer_interval_ms),
            },
        )
    });

    let addr = format!("{}:{}", args.host, args.port);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        result = start_server(&addr, Arc::clone(&store)) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        () = shutdown_signal => {
            info!("Server shut down gracefully");
        }
    }

    if let Some(producer) = producer.as_mut() {
        producer.stop();
        info!(events = producer.events_produced(), "Log producers stopped");
    }
    if let Some(evictor) = evictor.as_mut() {
        evictor.stop();
    }
    info!(events = store.len(), "Log store shut down");

    Ok(())
}
