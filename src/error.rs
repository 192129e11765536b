use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Frame or packet checksum did not match the received value.
    Checksum { expected: u16, computed: u16 },
    /// Device rejected the request with a nonzero error code.
    Device(i16),
    /// Device rejected the authentication handshake.
    Auth,
    /// A command was issued before a successful handshake.
    NotAuthenticated,
    /// No response arrived within the configured timeout.
    Timeout,
    InvalidMac(String),
    Protocol(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Checksum { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#06x}, computed {computed:#06x}"
                )
            }
            Error::Device(code) => write!(f, "device error code {code}"),
            Error::Auth => write!(f, "authentication rejected by device"),
            Error::NotAuthenticated => write!(f, "not authenticated"),
            Error::Timeout => write!(f, "timed out waiting for device response"),
            Error::InvalidMac(mac) => write!(f, "invalid MAC address: {mac}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
