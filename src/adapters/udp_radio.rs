//! UDP stand-in for the half-duplex radio.
//!
//! Implements [`RadioPort`] over a non-blocking `UdpSocket` so a collector
//! script on the host can talk to the simulated node.  Half-duplex rules
//! are enforced the way the transceiver behaves:
//!
//! - `send` while listening fails with [`RadioError::WrongMode`];
//! - datagrams arriving while not listening are discarded.
//!
//! Replies go to the sender of the most recent datagram, falling back to
//! the configured peer.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use log::{debug, info, warn};

use crate::app::ports::RadioPort;
use crate::config::RADIO_PAYLOAD_SIZE;
use crate::error::RadioError;

pub struct UdpRadio {
    bind: SocketAddr,
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    listening: bool,
}

impl UdpRadio {
    pub fn new(bind: SocketAddr, peer: Option<SocketAddr>) -> Self {
        Self {
            bind,
            socket: None,
            peer,
            listening: false,
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn drain(&mut self) {
        let Some(socket) = self.socket.as_ref() else {
            return;
        };
        let mut scratch = [0u8; RADIO_PAYLOAD_SIZE];
        while socket.recv_from(&mut scratch).is_ok() {
            debug!("Radio: dropped datagram received while transmitting");
        }
    }
}

impl RadioPort for UdpRadio {
    fn init(&mut self) -> Result<(), RadioError> {
        let socket = UdpSocket::bind(self.bind).map_err(|e| {
            warn!("Radio: bind {} failed: {}", self.bind, e);
            RadioError::NotResponding
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|_| RadioError::NotResponding)?;
        info!("Radio: UDP link on {}", self.bind);
        self.socket = Some(socket);
        Ok(())
    }

    fn start_listening(&mut self) {
        self.listening = true;
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn receive(&mut self, buf: &mut [u8; RADIO_PAYLOAD_SIZE]) -> Option<usize> {
        if !self.listening {
            self.drain();
            return None;
        }
        let socket = self.socket.as_ref()?;
        // Datagrams longer than the payload are truncated, as on air.
        let mut wide = [0u8; 2 * RADIO_PAYLOAD_SIZE];
        match socket.recv_from(&mut wide) {
            Ok((n, from)) => {
                self.peer = Some(from);
                let n = n.min(RADIO_PAYLOAD_SIZE);
                buf[..n].copy_from_slice(&wide[..n]);
                Some(n)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("Radio: receive failed: {}", e);
                None
            }
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if self.listening {
            return Err(RadioError::WrongMode);
        }
        let socket = self.socket.as_ref().ok_or(RadioError::NotResponding)?;
        let peer = self.peer.ok_or(RadioError::TxFailed)?;
        let payload = &payload[..payload.len().min(RADIO_PAYLOAD_SIZE)];
        socket.send_to(payload, peer).map_err(|e| {
            warn!("Radio: send to {} failed: {}", peer, e);
            RadioError::TxFailed
        })?;
        Ok(())
    }
}
