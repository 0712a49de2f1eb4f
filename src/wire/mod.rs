//! Wire model for the packet protocol.
//!
//! Every message is a [`WireHeader`] immediately followed by exactly
//! `header.length` payload bytes:
//!
//! ```text
//! Request:  <20-byte header><payload of exactly length bytes>
//! Response: <20-byte header><payload of exactly length bytes>
//! ```

mod buffer;
mod header;
mod packet;

pub use buffer::ByteBuffer;
pub use header::{Command, WireHeader, HEADER_SIZE};
pub use packet::Packet;
