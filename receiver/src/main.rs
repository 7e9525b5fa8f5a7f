mod display;
mod listener;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use anchor_types::FRAME_LEN;
use anyhow::Context;
use clap::Parser;
use positioning::config::SignalConfig;
use positioning::{EvaluationReport, PositioningConfig, PositioningEngine, ReceivedFrame, SignalSource};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{info, warn};

use listener::ListenerConfig;

// ─── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "trilat-receiver", about = "RSSI trilateration receiver for three fixed anchors")]
struct Args {
    /// Config file path (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// UDP listen address, overrides [listener].addr
    #[arg(long, env = "TRILAT_LISTEN_ADDR")]
    listen: Option<String>,
    /// Print evaluation reports as JSON lines instead of the status block
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReceiverConfig {
    listener: ListenerConfig,
    positioning: PositioningConfig,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ReceiverConfig> {
    let raw = match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read config {}", p.display()))?,
        None => include_str!("../config.toml").to_string(),
    };
    toml::from_str(&raw).context("invalid config.toml")
}

// ─── Main loop ────────────────────────────────────────────────────────────────

/// Owns the engine. Frames from the listener and poll ticks are serialized
/// here, so anchor state has exactly one writer. Runs until `shutdown`
/// completes and hands the engine back.
async fn run_receiver(
    mut engine: PositioningEngine,
    mut frames: mpsc::Receiver<ReceivedFrame>,
    poll_interval: Duration,
    mut on_report: impl FnMut(&EvaluationReport),
    shutdown: impl Future<Output = ()>,
) -> PositioningEngine {
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;
    let mut ticker = tokio::time::interval(poll_interval);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(frame) = frames.recv() => {
                engine.ingest(&frame, now_ms());
            }
            _ = ticker.tick() => {
                let outcome = engine.poll(now_ms());
                if let Some(report) = outcome.report {
                    on_report(&report);
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down after {} frames", engine.frames_received());
                return engine;
            }
        }
    }
}

/// UDP frames never carry RSSI, so a transport-only source can't activate
/// any anchor.
fn udp_signal_warning(signal: &SignalConfig) -> Option<&'static str> {
    (signal.source == SignalSource::Direct).then_some(
        "signal.source = \"direct\" but UDP frames carry no RSSI: every frame will be dropped, \
         use \"direct_with_fallback\" or \"random_walk\"",
    )
}

fn emit(report: &EvaluationReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("Failed to serialize report: {e}"),
        }
    } else {
        println!("\n{}\n", display::render(report));
    }
}

// ─── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trilat_receiver=info,positioning=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(addr) = args.listen {
        cfg.listener.addr = addr;
    }

    let engine = PositioningEngine::from_config(&cfg.positioning)
        .context("invalid positioning configuration")?;

    info!("📍 RSSI trilateration receiver starting");
    if let Some(msg) = udp_signal_warning(&cfg.positioning.signal) {
        warn!("{msg}");
    }
    info!("Expected frame size: {FRAME_LEN} bytes");
    for (idx, [x, y]) in cfg.positioning.anchors.positions.iter().enumerate() {
        info!("Anchor {} at ({x:.3}, {y:.3}) m", idx + 1);
    }

    let socket = listener::bind(&cfg.listener.addr)
        .await
        .with_context(|| format!("could not bind UDP {}", cfg.listener.addr))?;

    let (frames_tx, frames_rx) = mpsc::channel(cfg.listener.channel_capacity.max(1));
    tokio::spawn(listener::run_listener(socket, frames_tx));

    info!("Waiting for anchor frames...");
    let poll_interval = Duration::from_millis(cfg.positioning.timing.poll_interval_ms);
    let json = args.json;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };
    run_receiver(engine, frames_rx, poll_interval, |report| emit(report, json), shutdown).await;
    Ok(())
}
