//! Connection capability and the registry that owns live connections.
//!
//! The reactor knows connections only through the [`Connection`] trait.
//! A [`ConnectionFactory`] decides, per accepted socket, which connection
//! type to build; this is the single seam between the reactor and
//! application behaviour.

use mio::event::Source;
use mio::net::TcpStream;
use slab::Slab;
use std::net::SocketAddr;
use std::os::unix::io::RawFd;

/// Per-socket handler driven by the reactor.
///
/// Every hook runs to completion on the reactor thread. A connection that
/// closes itself inside a hook is removed by the reactor when the hook
/// returns.
pub trait Connection {
    /// Underlying descriptor, or `None` once closed.
    fn fd(&self) -> Option<RawFd>;

    /// The socket to register with the poller, or `None` once closed.
    fn source(&mut self) -> Option<&mut dyn Source>;

    /// Called once, after the connection is registered.
    fn on_start(&mut self) {}

    /// Called when the socket is readable.
    fn on_readable(&mut self);

    /// Called when the socket is writable.
    fn on_writable(&mut self);

    /// Whether the reactor should watch this socket for writability.
    fn wants_write_interest(&self) -> bool {
        false
    }

    /// Whether `on_readable` stopped early and must run again before the
    /// next blocking poll. Sources are edge-triggered, so no new event
    /// arrives for data already buffered.
    fn wants_reread(&self) -> bool {
        false
    }

    fn is_closed(&self) -> bool;

    /// Close the socket and discard pending output. Must be idempotent.
    fn close(&mut self);
}

/// Builds a connection for each accepted socket.
pub trait ConnectionFactory {
    /// Return `None` to reject the connection; the socket is then closed.
    fn new_connection(&mut self, stream: TcpStream, peer: SocketAddr)
        -> Option<Box<dyn Connection>>;
}

/// A registered connection and the interest it is registered with.
pub(crate) struct Entry {
    pub conn: Box<dyn Connection>,
    pub peer: SocketAddr,
    /// Whether WRITABLE is part of the current registration.
    pub write_interest: bool,
    /// Whether the token sits in the reactor's reread queue.
    pub reread_queued: bool,
}

/// Registry of active connections using slab allocation.
///
/// Provides O(1) insert, lookup, and remove operations. The slab key is the
/// poll token for the connection.
pub(crate) struct ConnectionRegistry {
    connections: Slab<Entry>,
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Create a new registry with specified maximum capacity.
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: Slab::with_capacity(max_connections.min(4096)),
            max_connections,
        }
    }

    /// Insert a new connection into the registry.
    ///
    /// Returns the connection back if the registry is at capacity.
    pub fn insert(
        &mut self,
        conn: Box<dyn Connection>,
        peer: SocketAddr,
    ) -> Result<usize, Box<dyn Connection>> {
        if self.is_full() {
            return Err(conn);
        }
        Ok(self.connections.insert(Entry {
            conn,
            peer,
            write_interest: false,
            reread_queued: false,
        }))
    }

    pub fn get_mut(&mut self, id: usize) -> Option<&mut Entry> {
        self.connections.get_mut(id)
    }

    /// Remove a connection from the registry.
    pub fn remove(&mut self, id: usize) -> Option<Entry> {
        self.connections.try_remove(id)
    }

    /// Number of active connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_full(&self) -> bool {
        self.connections.len() >= self.max_connections
    }

    /// Remove every connection.
    pub fn drain(&mut self) -> impl Iterator<Item = Entry> + '_ {
        self.connections.drain()
    }
}
