//! Stream connection: packet framing over a non-blocking byte stream.
//!
//! The read side is an explicit state machine that survives suspension
//! between readiness events:
//!
//! ```text
//!            header complete, length > 0
//! AwaitingHeader ───────────────────────────▶ AwaitingPayload
//!       ▲   │                                        │
//!       │   │ length == 0: deliver empty packet      │ payload complete:
//!       │   ▼                                        │ deliver packet
//!       └───────────────────────────────────────────┘
//! ```
//!
//! Each call consumes what the socket currently holds, up to a packet
//! budget, and returns on the first would-block, keeping partial header or
//! payload bytes for the next call. After every delivered packet the send queue is drained
//! opportunistically.

use crate::runtime::connection::Connection;
use crate::runtime::send_queue::{Drain, SendQueue};
use crate::wire::{ByteBuffer, Packet, WireHeader, HEADER_SIZE};
use mio::event::Source;
use mio::net::TcpStream;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::ops::{Deref, DerefMut};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::{debug, trace, warn};

/// Default upper bound on a single payload (64 MB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Default number of packets delivered per readable call.
pub const DEFAULT_READ_BUDGET: usize = 64;

/// Application hooks invoked by a stream connection.
///
/// Hooks receive the connection's send queue so they can reply without
/// re-entering the connection.
pub trait PacketHandler {
    /// Called once after the connection is registered with the reactor.
    fn on_start(&mut self, _queue: &mut SendQueue) {}

    /// Called for every complete packet, in arrival order.
    fn on_packet(&mut self, packet: Packet, queue: &mut SendQueue);

    /// Called when a drain attempt empties the send queue.
    fn on_queue_drained(&mut self, _queue: &mut SendQueue) {}
}

/// Read-side framing state.
#[derive(Debug)]
enum ReadState {
    AwaitingHeader {
        bytes: [u8; HEADER_SIZE],
        filled: usize,
    },
    AwaitingPayload {
        header: WireHeader,
        payload: ByteBuffer,
        filled: usize,
    },
}

impl Default for ReadState {
    fn default() -> Self {
        ReadState::AwaitingHeader {
            bytes: [0u8; HEADER_SIZE],
            filled: 0,
        }
    }
}

impl ReadState {
    /// Bytes of the current packet received so far.
    fn progress(&self) -> usize {
        match self {
            ReadState::AwaitingHeader { filled, .. } => *filled,
            ReadState::AwaitingPayload { filled, .. } => HEADER_SIZE + filled,
        }
    }
}

/// A connection that frames packets and queues replies.
///
/// Write interest is never requested from the reactor: the queue drains only
/// after a packet is delivered or when the reactor reports writability for
/// some other reason. Wrap in [`AutoFlagStreamConnection`] to have the
/// reactor watch for writability while bytes are pending.
pub struct StreamConnection<H, S = TcpStream> {
    stream: Option<S>,
    peer: Option<SocketAddr>,
    read_state: ReadState,
    queue: SendQueue,
    handler: H,
    max_payload_size: usize,
    read_budget: usize,
    /// Budget ran out before the socket would block.
    read_pending: bool,
}

impl<H: PacketHandler, S: Read + Write> StreamConnection<H, S> {
    pub fn new(stream: S, handler: H) -> Self {
        Self {
            stream: Some(stream),
            peer: None,
            read_state: ReadState::default(),
            queue: SendQueue::new(),
            handler,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            read_budget: DEFAULT_READ_BUDGET,
            read_pending: false,
        }
    }

    /// Record the peer address for logging.
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Payloads longer than this close the connection.
    pub fn with_max_payload_size(mut self, max: usize) -> Self {
        self.max_payload_size = max;
        self
    }

    /// Packets delivered per `handle_readable` call before yielding.
    pub fn with_read_budget(mut self, packets: usize) -> Self {
        self.read_budget = packets.max(1);
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Queue a packet for sending. No I/O happens here.
    pub fn send(&mut self, packet: Packet) {
        self.queue.send(packet);
    }

    pub fn want_write(&self) -> bool {
        self.queue.want_write()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Whether the socket may still hold unread data after the last
    /// `handle_readable` call.
    pub fn read_pending(&self) -> bool {
        self.read_pending
    }

    /// Whether a payload is partially received.
    pub fn is_awaiting_payload(&self) -> bool {
        matches!(self.read_state, ReadState::AwaitingPayload { .. })
    }

    /// Run the application's start hook.
    pub fn start(&mut self) {
        if self.is_closed() {
            return;
        }
        self.handler.on_start(&mut self.queue);
    }

    /// Decode and deliver packets until the socket would block or the read
    /// budget is spent. In the latter case `read_pending` is set and the
    /// caller must call again without waiting for a new readiness event.
    pub fn handle_readable(&mut self) {
        self.read_pending = false;
        let mut delivered = 0;
        loop {
            if delivered == self.read_budget {
                self.read_pending = !self.is_closed();
                return;
            }
            match self.read_packet() {
                Ok(Some(packet)) => {
                    trace!(
                        peer = ?self.peer,
                        command = packet.header().command,
                        length = packet.header().length,
                        "Packet received"
                    );
                    self.handler.on_packet(packet, &mut self.queue);
                    delivered += 1;
                    self.flush();
                    if self.is_closed() {
                        return;
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    let partial = self.read_state.progress();
                    if e.kind() == io::ErrorKind::UnexpectedEof {
                        debug!(peer = ?self.peer, partial, "Connection closed by peer");
                    } else {
                        warn!(peer = ?self.peer, partial, error = %e, "Read failed");
                    }
                    self.close();
                    return;
                }
            }
        }
    }

    /// Drain as much of the send queue as the socket accepts.
    pub fn flush(&mut self) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        if self.queue.is_empty() {
            return;
        }

        match self.queue.drain_into(stream) {
            Ok(Drain::Complete) => self.handler.on_queue_drained(&mut self.queue),
            Ok(Drain::Pending) => {
                trace!(
                    peer = ?self.peer,
                    queued = self.queue.len(),
                    pending_bytes = self.queue.pending_bytes(),
                    "Send queue pending"
                );
            }
            Err(e) => {
                warn!(peer = ?self.peer, error = %e, "Write failed");
                self.close();
            }
        }
    }

    /// Close the socket and discard all state. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(
                peer = ?self.peer,
                discarded = self.queue.len(),
                "Connection closed"
            );
        }
        self.queue.clear();
        self.read_state = ReadState::default();
        self.read_pending = false;
    }

    /// Advance the read state machine by as much as the socket allows.
    ///
    /// `Ok(None)` means the socket would block before a packet completed.
    fn read_packet(&mut self) -> io::Result<Option<Packet>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };

        loop {
            match &mut self.read_state {
                ReadState::AwaitingHeader { bytes, filled } => {
                    if !fill(stream, bytes, filled)? {
                        return Ok(None);
                    }
                    let header = WireHeader::from_bytes(bytes);
                    let length = header.length as usize;

                    if length == 0 {
                        self.read_state = ReadState::default();
                        return Ok(Some(Packet::from_wire(header, ByteBuffer::new())));
                    }
                    if length > self.max_payload_size {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "payload too large: {} > {}",
                                length, self.max_payload_size
                            ),
                        ));
                    }

                    self.read_state = ReadState::AwaitingPayload {
                        header,
                        payload: ByteBuffer::zeroed(length),
                        filled: 0,
                    };
                }
                ReadState::AwaitingPayload {
                    header,
                    payload,
                    filled,
                } => {
                    if !fill(stream, payload.as_mut_slice(), filled)? {
                        return Ok(None);
                    }
                    let packet = Packet::from_wire(*header, payload.take());
                    self.read_state = ReadState::default();
                    return Ok(Some(packet));
                }
            }
        }
    }
}

/// Read into `buf[*filled..]` until full or the socket would block.
///
/// Returns `true` once `buf` is full. A zero-length read is reported as
/// `UnexpectedEof`.
fn fill<R: Read>(src: &mut R, buf: &mut [u8], filled: &mut usize) -> io::Result<bool> {
    while *filled < buf.len() {
        match src.read(&mut buf[*filled..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "EOF"));
            }
            Ok(n) => *filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

impl<H, S> Connection for StreamConnection<H, S>
where
    H: PacketHandler,
    S: Read + Write + Source + AsRawFd,
{
    fn fd(&self) -> Option<RawFd> {
        self.stream.as_ref().map(AsRawFd::as_raw_fd)
    }

    fn source(&mut self) -> Option<&mut dyn Source> {
        self.stream.as_mut().map(|s| s as &mut dyn Source)
    }

    fn on_start(&mut self) {
        self.start();
    }

    fn on_readable(&mut self) {
        self.handle_readable();
    }

    fn on_writable(&mut self) {
        self.flush();
    }

    fn wants_reread(&self) -> bool {
        self.read_pending
    }

    fn is_closed(&self) -> bool {
        StreamConnection::is_closed(self)
    }

    fn close(&mut self) {
        StreamConnection::close(self);
    }
}

/// Stream connection that keeps the reactor's write interest in sync with
/// its send queue.
///
/// While bytes are pending the reactor watches for writability and calls
/// `on_writable`, so replies are flushed even if the peer never sends again.
pub struct AutoFlagStreamConnection<H, S = TcpStream>(StreamConnection<H, S>);

impl<H: PacketHandler, S: Read + Write> AutoFlagStreamConnection<H, S> {
    pub fn new(inner: StreamConnection<H, S>) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> StreamConnection<H, S> {
        self.0
    }
}

impl<H, S> Deref for AutoFlagStreamConnection<H, S> {
    type Target = StreamConnection<H, S>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<H, S> DerefMut for AutoFlagStreamConnection<H, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<H, S> Connection for AutoFlagStreamConnection<H, S>
where
    H: PacketHandler,
    S: Read + Write + Source + AsRawFd,
{
    fn fd(&self) -> Option<RawFd> {
        Connection::fd(&self.0)
    }

    fn source(&mut self) -> Option<&mut dyn Source> {
        Connection::source(&mut self.0)
    }

    fn on_start(&mut self) {
        self.0.start();
    }

    fn on_readable(&mut self) {
        self.0.handle_readable();
    }

    fn on_writable(&mut self) {
        self.0.flush();
    }

    fn wants_write_interest(&self) -> bool {
        self.0.want_write()
    }

    fn wants_reread(&self) -> bool {
        self.0.read_pending()
    }

    fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    fn close(&mut self) {
        self.0.close();
    }
}
