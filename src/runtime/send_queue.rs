//! Outbound packet queue with partial-write tracking.
//!
//! Packets leave in FIFO order. A byte cursor into the front packet records
//! how much of its header and payload have already reached the socket, so a
//! short write resumes exactly where it stopped.

use crate::wire::{Packet, HEADER_SIZE};
use std::collections::VecDeque;
use std::io::{self, Write};

/// Outcome of a drain attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every queued packet was written.
    Complete,
    /// The socket stopped accepting bytes; the remainder stays queued.
    Pending,
}

/// FIFO of packets waiting to be written.
#[derive(Debug, Default)]
pub struct SendQueue {
    packets: VecDeque<Packet>,
    /// Bytes of the front packet already written (header first, then payload).
    written: usize,
    want_write: bool,
}

impl SendQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a packet. Performs no I/O.
    pub fn send(&mut self, packet: Packet) {
        self.packets.push_back(packet);
        self.want_write = true;
    }

    /// Whether queued bytes are still waiting for the socket.
    pub fn want_write(&self) -> bool {
        self.want_write
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Bytes still to be written across all queued packets.
    pub fn pending_bytes(&self) -> usize {
        let total: usize = self.packets.iter().map(Packet::wire_len).sum();
        total - self.written
    }

    /// Drop every queued packet, including a partially written one.
    pub fn clear(&mut self) {
        self.packets.clear();
        self.written = 0;
        self.want_write = false;
    }

    /// Write as much of the queue as `dst` accepts.
    ///
    /// Stops at the first would-block or short write. Errors (including a
    /// zero-byte write) are returned for the caller to close on.
    pub fn drain_into<W: Write>(&mut self, dst: &mut W) -> io::Result<Drain> {
        while let Some(packet) = self.packets.front() {
            if self.written < HEADER_SIZE {
                let header = packet.header().to_bytes();
                if !write_segment(dst, &header, &mut self.written)? {
                    return Ok(Drain::Pending);
                }
            }

            let payload = packet.payload().as_slice();
            let mut offset = self.written - HEADER_SIZE;
            if offset < payload.len() {
                let done = write_segment(dst, payload, &mut offset)?;
                self.written = HEADER_SIZE + offset;
                if !done {
                    return Ok(Drain::Pending);
                }
            }

            self.packets.pop_front();
            self.written = 0;
        }

        self.want_write = false;
        Ok(Drain::Complete)
    }
}

/// Attempt one write of `buf[*cursor..]`, advancing the cursor.
///
/// Returns `true` once the segment is fully written.
fn write_segment<W: Write>(dst: &mut W, buf: &[u8], cursor: &mut usize) -> io::Result<bool> {
    loop {
        match dst.write(&buf[*cursor..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(n) => {
                *cursor += n;
                return Ok(*cursor == buf.len());
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
