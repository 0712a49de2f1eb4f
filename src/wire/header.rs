//! Fixed 20-byte packet header.
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬──────────┐
//! │ Command  │ Length   │ Error    │ Extra 1  │ Extra 2  │
//! │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │ u32 LE   │
//! └──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! `length` is the number of payload bytes that immediately follow.

use bytes::{Buf, BufMut};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 20;

/// Well-known command values.
///
/// Any other value is reserved and carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Command {
    Default = 9,
    Ack = 1,
    Error = 2,
    ReadEof = 3,
    WriteClosed = 4,
}

impl TryFrom<u32> for Command {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        match value {
            9 => Ok(Command::Default),
            1 => Ok(Command::Ack),
            2 => Ok(Command::Error),
            3 => Ok(Command::ReadEof),
            4 => Ok(Command::WriteClosed),
            other => Err(other),
        }
    }
}

impl From<Command> for u32 {
    fn from(command: Command) -> u32 {
        command as u32
    }
}

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireHeader {
    pub command: u32,
    /// Payload length in bytes.
    pub length: u32,
    pub error: u32,
    pub extra1: u32,
    pub extra2: u32,
}

impl WireHeader {
    /// Header for `command` carrying `length` payload bytes.
    pub fn new(command: Command, length: u32) -> Self {
        Self {
            command: command.into(),
            length,
            ..Self::default()
        }
    }

    /// The command as a known value, or `None` for reserved values.
    pub fn kind(&self) -> Option<Command> {
        Command::try_from(self.command).ok()
    }

    pub fn is(&self, command: Command) -> bool {
        self.command == u32::from(command)
    }

    /// Encode to the wire representation.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut &mut buf[..]);
        buf
    }

    /// Append the wire representation to `dst`.
    pub fn encode_into<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.command);
        dst.put_u32_le(self.length);
        dst.put_u32_le(self.error);
        dst.put_u32_le(self.extra1);
        dst.put_u32_le(self.extra2);
    }

    /// Decode from exactly one header's worth of bytes.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut src = &bytes[..];
        Self {
            command: src.get_u32_le(),
            length: src.get_u32_le(),
            error: src.get_u32_le(),
            extra1: src.get_u32_le(),
            extra2: src.get_u32_le(),
        }
    }

    /// Decode from the front of `src`, or `None` if it is too short.
    pub fn decode(src: &[u8]) -> Option<Self> {
        let bytes: &[u8; HEADER_SIZE] = src.get(..HEADER_SIZE)?.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }
}
