use anyhow::Context;
use clap::Parser;
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;

use computing_status_sync::build_synchronizer;
use computing_status_sync::domain::computing_status::notification::ObservationKey;
use computing_status_sync::domain::computing_status::status_cache::{LoggingStatusListener, StatusCache};
use computing_status_sync::loader::parser::parse_json_file;
use computing_status_sync::logger;

/// Keeps computation statuses of a study node in sync with the study server,
/// replaying recorded study update notifications.
#[derive(Debug, Parser)]
#[command(name = "status-sync", version)]
struct Args {
    /// Synchronizer configuration (JSON).
    #[arg(long)]
    config: String,

    #[arg(long)]
    study: String,

    #[arg(long)]
    node: String,

    /// JSON array of study update messages to replay in order.
    #[arg(long)]
    events: Option<String>,
}

async fn settle(handles: Vec<JoinHandle<()>>) {
    for result in join_all(handles).await {
        if let Err(e) = result {
            log::error!("Status fetch task failed: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let cache = StatusCache::new();
    cache.subscribe(Arc::new(LoggingStatusListener));

    let mut synchronizer = build_synchronizer(&args.config, cache.clone()).with_context(|| format!("Cannot set up synchronizer from '{}'", args.config))?;

    settle(synchronizer.switch_node(ObservationKey::new(args.study, args.node))).await;

    if let Some(events_path) = args.events {
        let updates: Vec<serde_json::Value> = parse_json_file(&events_path).with_context(|| format!("Cannot read study updates from '{}'", events_path))?;
        log::info!("Replaying {} study updates.", updates.len());

        for update in updates {
            match synchronizer.on_study_update(&update.to_string()) {
                Ok(handles) => settle(handles).await,
                Err(e) => log::warn!("Skipping malformed study update: {}", e),
            }
        }
    }

    let mut snapshot: Vec<_> = cache.snapshot().into_iter().collect();
    snapshot.sort_by_key(|(computing_type, _)| *computing_type);
    for (computing_type, status) in snapshot {
        println!("{:<32}{}", computing_type, status);
    }
    match cache.get_last_completed() {
        Some(computing_type) => println!("Last completed computation: {}", computing_type),
        None => println!("Last completed computation: none"),
    }

    Ok(())
}
