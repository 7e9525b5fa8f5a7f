//! udp_tx.rs — UDP transmitter for anchor frames
//!
//! Stands in for the point-to-point radio link: every frame is one datagram
//! to the receiver's listen address. Delivery is not guaranteed and nothing is
//! retried; send errors are returned to the caller, which logs and moves on.

use std::io;
use std::net::UdpSocket;

use anchor_types::WireFrame;
use tracing::debug;

pub struct UdpTransmitter {
    socket: UdpSocket,
    target: String,
}

impl UdpTransmitter {
    /// Bind an ephemeral local port aimed at `target` (e.g. "127.0.0.1:4210").
    pub fn new(target: &str) -> Result<Self, io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(false)?;
        Ok(Self { socket, target: target.to_string() })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn send_frame(&self, frame: &WireFrame) -> io::Result<()> {
        let bytes = frame.to_bytes();
        self.socket.send_to(&bytes, &self.target)?;
        debug!("UDP → {} anchor={} seq={}", self.target, frame.anchor_id, frame.sequence());
        Ok(())
    }
}
