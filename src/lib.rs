//! packet-reactor: a single-threaded TCP reactor for length-prefixed packets.
//!
//! Every message on the wire is a fixed 20-byte header followed by exactly
//! `length` payload bytes. Connections are driven by one event loop; the
//! application plugs in through [`runtime::ConnectionFactory`] and
//! [`runtime::PacketHandler`].

pub mod config;
pub mod error;
pub mod protocols;
pub mod runtime;
pub mod wire;

pub use error::{PacketError, ReactorError};
pub use runtime::{
    AutoFlagStreamConnection, Connection, ConnectionFactory, PacketHandler, Reactor,
    ReactorConfig, SendQueue, StopHandle, StreamConnection,
};
pub use wire::{ByteBuffer, Command, Packet, WireHeader, HEADER_SIZE};
