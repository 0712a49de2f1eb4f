//! Readiness-based networking runtime.
//!
//! Built on mio (epoll on Linux, kqueue on macOS):
//! - `Reactor`: owns the listener, the poll handle and every connection
//! - `Connection`: per-socket hooks the reactor drives
//! - `ConnectionFactory`: builds a connection for each accepted socket
//! - `StreamConnection`: packet framing over a non-blocking stream
//! - `SendQueue`: outbound FIFO with partial-write tracking

mod connection;
mod reactor;
mod send_queue;
mod stream;

pub use connection::{Connection, ConnectionFactory};
pub use reactor::{Reactor, ReactorConfig, StopHandle};
pub use send_queue::{Drain, SendQueue};
pub use stream::{
    AutoFlagStreamConnection, PacketHandler, StreamConnection, DEFAULT_MAX_PAYLOAD_SIZE,
    DEFAULT_READ_BUDGET,
};
