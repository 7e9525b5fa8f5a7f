//! main.rs — anchor transmitter simulator entry point
//!
//! Plays one or more fixed anchors. Every broadcast interval each anchor emits
//! one 12-byte frame (id, sequence, signal byte) to the receiver over UDP.
//!
//! Knobs for exercising the receiver:
//!   --drop-rate       probability that a frame is silently not sent
//!   --stop-after-ms   stop transmitting after this long (anchor timeouts)
//!   --anchors         subset of anchors to play (e.g. `1,2` to starve the solver)

mod beacon;
mod udp_tx;

use std::time::{Duration, Instant};

use anchor_types::{BROADCAST_INTERVAL_MS, MAX_ANCHORS, SIGNAL_UNAVAILABLE};
use anyhow::{ensure, Context};
use clap::Parser;
use rand::Rng;
use tokio::time::interval;
use tracing::{info, warn};

use beacon::AnchorBeacon;
use udp_tx::UdpTransmitter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "anchor-sim", about = "Anchor transmitter simulator")]
struct Args {
    /// Receiver address
    #[arg(long, default_value = "127.0.0.1:4210")]
    target: String,
    /// Anchor ids to simulate
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    anchors: Vec<u8>,
    /// Period between two frames of the same anchor
    #[arg(long, default_value_t = BROADCAST_INTERVAL_MS)]
    interval_ms: u64,
    /// Signal byte carried in every frame (-1 = battery level unavailable)
    #[arg(long, default_value_t = SIGNAL_UNAVAILABLE, allow_hyphen_values = true)]
    signal_byte: i8,
    /// Probability of skipping a frame, 0.0..=1.0
    #[arg(long, default_value_t = 0.0)]
    drop_rate: f64,
    /// Stop transmitting after this many milliseconds
    #[arg(long)]
    stop_after_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anchor_sim=info".into()),
        )
        .init();

    let args = Args::parse();

    ensure!((0.0..=1.0).contains(&args.drop_rate), "--drop-rate must be within 0.0..=1.0");
    ensure!(args.interval_ms > 0, "--interval-ms must be greater than zero");
    ensure!(!args.anchors.is_empty(), "--anchors must name at least one anchor");
    for &id in &args.anchors {
        if id == 0 || id as usize > MAX_ANCHORS {
            // Still sent: the receiver is expected to drop it
            warn!("Anchor id {id} is outside 1..={MAX_ANCHORS}; the receiver will reject its frames");
        }
    }

    let transmitter = UdpTransmitter::new(&args.target)
        .with_context(|| format!("failed to bind UDP socket for {}", args.target))?;

    let mut beacons: Vec<AnchorBeacon> = args
        .anchors
        .iter()
        .map(|&id| AnchorBeacon::new(id, args.signal_byte))
        .collect();

    info!(
        "📡 Anchor simulator: anchors {:?} → {} every {} ms (drop rate {:.0}%)",
        args.anchors,
        transmitter.target(),
        args.interval_ms,
        args.drop_rate * 100.0
    );

    run(&transmitter, &mut beacons, &args).await;

    for b in &beacons {
        info!(
            "Anchor {}: sent={} failed={} dropped={}",
            b.anchor_id,
            b.sent(),
            b.failed(),
            b.skipped()
        );
    }
    Ok(())
}

// ── Broadcast loop ────────────────────────────────────────────────────────────

async fn run(tx: &UdpTransmitter, beacons: &mut [AnchorBeacon], args: &Args) {
    let mut ticker = interval(Duration::from_millis(args.interval_ms));
    let started = Instant::now();
    let mut rng = rand::thread_rng();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return;
            }
        }

        if let Some(limit) = args.stop_after_ms {
            if started.elapsed() >= Duration::from_millis(limit) {
                info!("⏹ Stopping after {limit} ms");
                return;
            }
        }

        for beacon in beacons.iter_mut() {
            let frame = beacon.next_frame();

            if args.drop_rate > 0.0 && rng.gen_bool(args.drop_rate) {
                beacon.record_skipped();
                continue;
            }

            match tx.send_frame(&frame) {
                Ok(()) => beacon.record_sent(),
                Err(e) => {
                    beacon.record_failed();
                    warn!("Anchor {}: send failed: {e}", beacon.anchor_id);
                }
            }
        }
    }
}
