//! Protocol implementations.
//!
//! Each protocol supplies a `PacketHandler` and a `ConnectionFactory` that
//! the reactor uses for accepted sockets.
//!
//! - `echo`: Echo service, re-sends DEFAULT packets unchanged

pub mod echo;
