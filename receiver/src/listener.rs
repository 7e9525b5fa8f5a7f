//! # listener
//!
//! UDP side of the receiver. Anchor frames arrive as datagrams; this task
//! wraps each one in a [`ReceivedFrame`] and forwards it over an mpsc channel
//! to the main loop, which is the only owner of the positioning engine.
//!
//! The listener never looks inside the payload: length and anchor checks are
//! the engine's job so every datagram shows up in the arrival counter.
//! A full channel drops the datagram (warned); receive errors are logged and
//! the loop carries on.

use positioning::ReceivedFrame;
use serde::Deserialize;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// UDP address to bind (`--listen` / TRILAT_LISTEN_ADDR override it)
    pub addr: String,
    /// Frames buffered between the socket and the main loop
    pub channel_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:4210".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// Largest datagram we bother reading; anything longer is malformed anyway.
const MAX_DATAGRAM: usize = 1500;

pub async fn bind(addr: &str) -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).await?;
    info!("📡 Listening for anchor frames on UDP {}", socket.local_addr()?);
    Ok(socket)
}

/// Receive loop. Returns once the main loop has dropped its receiver.
pub async fn run_listener(socket: UdpSocket, frames: mpsc::Sender<ReceivedFrame>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(e) => {
                warn!("UDP recv error: {e}");
                continue;
            }
        };

        let frame = ReceivedFrame {
            sender: src.to_string(),
            payload: buf[..len].to_vec(),
            // No per-datagram signal strength over UDP
            reported_rssi: None,
        };

        match frames.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Frame channel full, dropping datagram from {src}");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Frame channel closed, listener exiting");
                return;
            }
        }
    }
}
