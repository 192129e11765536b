use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

use tracing::trace;

use crate::{Error, Result};

/// One request/response exchange with the device. The protocol correlates
/// request and response by timing only, so implementations must complete
/// one exchange before starting the next; the client enforces this with
/// `&mut self` receivers.
pub trait Transport: Send {
    fn exchange(&mut self, packet: &[u8]) -> Result<Vec<u8>>;
}

/// Blocking UDP transport: single-shot send to the device's host:port,
/// one receive bounded by the configured timeout. No retries, no pooling.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        socket.connect((host, port))?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(Self { socket })
    }
}

impl Transport for UdpTransport {
    fn exchange(&mut self, packet: &[u8]) -> Result<Vec<u8>> {
        self.socket.send(packet)?;
        let mut buf = [0u8; 2048];
        match self.socket.recv(&mut buf) {
            Ok(n) => {
                trace!(bytes = n, "received response");
                Ok(buf[..n].to_vec())
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(Error::Timeout)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}
