//! Echo protocol implementation.
//!
//! A simple echo service for throughput and I/O testing: every packet whose
//! command is DEFAULT goes back to the sender unchanged, header included.
//!
//! ## Use Cases
//!
//! 1. **Throughput testing**: Measure raw I/O throughput of the reactor
//!    without any application work per packet.
//!
//! 2. **Variable payload sizes**: Exercise framing with payloads from zero
//!    bytes up to the configured maximum, to surface partial read and write
//!    handling issues.
//!
//! 3. **Correctness validation**: Verify data integrity by comparing echoed
//!    packets against sent packets.
//!
//! ## Protocol Format
//!
//! ```text
//! Request:  <20-byte header: command=DEFAULT, length=N> <N payload bytes>
//! Response: the same header and payload
//!
//! Example:
//! Request:  {command=9, length=5, error=0, extra1=0, extra2=0} "hello"
//! Response: {command=9, length=5, error=0, extra1=0, extra2=0} "hello"
//! ```
//!
//! Packets with any other command are consumed and not answered.

pub mod handler;

pub use handler::{EchoFactory, EchoHandler};
