//! Echo protocol handler for the reactor runtime.

use crate::config::WriteMode;
use crate::runtime::{
    AutoFlagStreamConnection, Connection, ConnectionFactory, PacketHandler, SendQueue,
    StreamConnection, DEFAULT_MAX_PAYLOAD_SIZE,
};
use crate::wire::{Command, Packet};
use mio::net::TcpStream;
use std::net::SocketAddr;
use tracing::debug;

/// Re-sends every DEFAULT packet it receives.
#[derive(Debug, Default)]
pub struct EchoHandler;

impl PacketHandler for EchoHandler {
    fn on_packet(&mut self, packet: Packet, queue: &mut SendQueue) {
        if packet.header().is(Command::Default) {
            queue.send(packet);
        } else {
            debug!(
                command = packet.header().command,
                length = packet.header().length,
                "Ignoring non-echo packet"
            );
        }
    }
}

/// Builds an echo connection for every accepted socket.
#[derive(Debug, Clone)]
pub struct EchoFactory {
    write_mode: WriteMode,
    max_payload_size: usize,
}

impl EchoFactory {
    pub fn new(write_mode: WriteMode, max_payload_size: usize) -> Self {
        Self {
            write_mode,
            max_payload_size,
        }
    }
}

impl Default for EchoFactory {
    fn default() -> Self {
        Self::new(WriteMode::default(), DEFAULT_MAX_PAYLOAD_SIZE)
    }
}

impl ConnectionFactory for EchoFactory {
    fn new_connection(
        &mut self,
        stream: TcpStream,
        peer: SocketAddr,
    ) -> Option<Box<dyn Connection>> {
        let conn = StreamConnection::new(stream, EchoHandler)
            .with_peer(peer)
            .with_max_payload_size(self.max_payload_size);

        let conn: Box<dyn Connection> = match self.write_mode {
            WriteMode::Auto => Box::new(AutoFlagStreamConnection::new(conn)),
            WriteMode::Opportunistic => Box::new(conn),
        };
        Some(conn)
    }
}
