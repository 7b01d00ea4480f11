//! Tile Scheduler replay tool
//!
//! Drives a scheduler from a recorded event stream and prints the
//! instructions it would send to the media transport.
//!
//! # I/O
//!
//! - stdin: one JSON object per line, either a scheduler event
//!   (`{"type":"joined","participant":{"id":"a","has_video":true}}`,
//!   `{"type":"resized","width":1280,"height":720}`, ...) or a directive
//!   (`{"type":"wait","ms":100}`, `{"type":"flush"}`, `{"type":"snapshot"}`)
//! - stdout: one JSON object per instruction or requested snapshot
//! - stderr: logs, filtered by `RUST_LOG`
//!
//! At end of input any pending recomputation is flushed before exit.

#![warn(clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tile_scheduler::actors::{SchedulerActor, SchedulerActorHandle};
use tile_scheduler::config::Config;
use tile_scheduler::errors::SchedulerError;
use tile_scheduler::observability::init_metrics_recorder;
use tile_scheduler::state::{SchedulerEvent, SchedulerState};
use tile_scheduler::transport::{JsonLinesTransport, MediaTransport};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Replay-only commands interleaved with events.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Directive {
    /// Let time pass so debounced recomputations can fire.
    Wait { ms: u64 },
    /// Recompute immediately.
    Flush,
    /// Print the current snapshot.
    Snapshot,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Directive(Directive),
    Event(SchedulerEvent),
}

async fn replay_line(handle: &SchedulerActorHandle, line: ReplayLine) -> Result<()> {
    match line {
        ReplayLine::Event(event) => handle.send_event(event).await?,
        ReplayLine::Directive(Directive::Wait { ms }) => {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        ReplayLine::Directive(Directive::Flush) => {
            handle.flush().await?;
        }
        ReplayLine::Directive(Directive::Snapshot) => {
            let snapshot = handle.snapshot().await?;
            let mut out = serde_json::to_vec(&serde_json::json!({
                "type": "snapshot",
                "snapshot": snapshot,
            }))
            .context("Failed to serialize snapshot")?;
            out.push(b'\n');
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries instructions only.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tile_scheduler=info,ts=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().map_err(SchedulerError::from).map_err(|e| {
        error!(error_kind = e.kind(), "Failed to load configuration: {}", e);
        e
    })?;

    info!(
        view_mode = ?config.view_mode,
        budget = ?config.budget,
        max_tiles_per_page = config.settings.max_tiles_per_page,
        small_call_threshold = config.settings.small_call_threshold,
        debounce_ms = u64::try_from(config.recompute_debounce.as_millis()).unwrap_or(u64::MAX),
        "Configuration loaded successfully"
    );

    if let Some(addr) = config.metrics_bind_address {
        init_metrics_recorder(Some(addr)).map_err(anyhow::Error::msg)?;
        info!(%addr, "Prometheus exporter listening");
    }

    let transport: Arc<dyn MediaTransport> = Arc::new(JsonLinesTransport::new(tokio::io::stdout()));
    let cancel_token = CancellationToken::new();
    let (handle, task) = SchedulerActor::spawn(
        "replay",
        SchedulerState::from_config(&config),
        config.recompute_debounce,
        transport,
        cancel_token.clone(),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0_usize;
    let mut skipped = 0_usize;

    loop {
        tokio::select! {
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("Received SIGINT, stopping replay"),
                    Err(e) => warn!(error = %e, "Failed to listen for SIGINT"),
                }
                break;
            }

            next = lines.next_line() => {
                let Some(raw) = next.context("Failed to read stdin")? else {
                    break;
                };
                line_number += 1;
                if raw.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ReplayLine>(&raw) {
                    Ok(line) => replay_line(&handle, line).await?,
                    Err(e) => {
                        skipped += 1;
                        warn!(line = line_number, error = %e, "Skipping unrecognized input line");
                    }
                }
            }
        }
    }

    handle.flush().await.context("Final flush failed")?;
    handle.shutdown().await.context("Shutdown failed")?;
    task.await.context("Scheduler task panicked")?;

    info!(lines = line_number, skipped, "Replay finished");
    Ok(())
}
