//! Error types for the packet model and the reactor.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Errors raised while building or decoding packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Header length field disagrees with the payload.
    LengthMismatch { header: u32, payload: usize },
    /// Not enough bytes for a whole header or payload.
    Truncated { needed: usize, available: usize },
    /// Payload exceeds the allowed size.
    PayloadTooLarge { length: usize, max: usize },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::LengthMismatch { header, payload } => {
                write!(
                    f,
                    "header length {} does not match payload length {}",
                    header, payload
                )
            }
            PacketError::Truncated { needed, available } => {
                write!(f, "truncated packet: need {} bytes, have {}", needed, available)
            }
            PacketError::PayloadTooLarge { length, max } => {
                write!(f, "payload too large: {} > {}", length, max)
            }
        }
    }
}

impl std::error::Error for PacketError {}

/// Errors raised by the reactor.
///
/// Startup failures name the step that failed; any resources acquired
/// before that step have already been released.
#[derive(Debug)]
pub enum ReactorError {
    InvalidAddress(String),
    Socket(io::Error),
    Bind(SocketAddr, io::Error),
    Listen(io::Error),
    Poll(io::Error),
    Register(io::Error),
    /// `run` was called without a successful `listen`.
    NotListening,
    /// The readiness wait failed with something other than an interrupt.
    Wait(io::Error),
}

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactorError::InvalidAddress(host) => write!(f, "Invalid address: {}", host),
            ReactorError::Socket(e) => write!(f, "Failed to create socket: {}", e),
            ReactorError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
            ReactorError::Listen(e) => write!(f, "Failed to listen: {}", e),
            ReactorError::Poll(e) => write!(f, "Failed to create poll handle: {}", e),
            ReactorError::Register(e) => write!(f, "Failed to register listener: {}", e),
            ReactorError::NotListening => write!(f, "Server not listening"),
            ReactorError::Wait(e) => write!(f, "Poll wait failed: {}", e),
        }
    }
}

impl std::error::Error for ReactorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReactorError::Socket(e)
            | ReactorError::Bind(_, e)
            | ReactorError::Listen(e)
            | ReactorError::Poll(e)
            | ReactorError::Register(e)
            | ReactorError::Wait(e) => Some(e),
            ReactorError::InvalidAddress(_) | ReactorError::NotListening => None,
        }
    }
}
