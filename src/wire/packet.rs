//! Packet: a header plus its owned payload.
//!
//! Every constructor keeps `header.length == payload.len()`. Packets are
//! move-only in the send and receive paths; `Clone` exists for callers that
//! explicitly want a second copy of the payload.

use crate::error::PacketError;
use crate::wire::buffer::ByteBuffer;
use crate::wire::header::{Command, WireHeader, HEADER_SIZE};
use bytes::{BufMut, Bytes, BytesMut};

/// A framed protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: WireHeader,
    payload: ByteBuffer,
}

impl Packet {
    /// Build a packet whose header is derived from `command` and the payload.
    pub fn with_command(
        command: Command,
        payload: impl Into<ByteBuffer>,
    ) -> Result<Self, PacketError> {
        let payload = payload.into();
        let length = wire_length(payload.len())?;
        Ok(Self {
            header: WireHeader::new(command, length),
            payload,
        })
    }

    /// Build a packet from an existing header.
    ///
    /// Fails if `header.length` does not match the payload length.
    pub fn new(header: WireHeader, payload: impl Into<ByteBuffer>) -> Result<Self, PacketError> {
        let payload = payload.into();
        if header.length as usize != payload.len() {
            return Err(PacketError::LengthMismatch {
                header: header.length,
                payload: payload.len(),
            });
        }
        Ok(Self { header, payload })
    }

    /// Assemble a packet from a header and a payload that was read using that
    /// header's length.
    pub(crate) fn from_wire(header: WireHeader, payload: ByteBuffer) -> Self {
        debug_assert_eq!(header.length as usize, payload.len());
        Self { header, payload }
    }

    pub fn header(&self) -> &WireHeader {
        &self.header
    }

    pub fn payload(&self) -> &ByteBuffer {
        &self.payload
    }

    /// Set the command field. Length is untouched, so the invariant holds.
    pub fn set_command(&mut self, command: u32) {
        self.header.command = command;
    }

    /// Set the error and extra fields.
    pub fn set_error(&mut self, error: u32) {
        self.header.error = error;
    }

    pub fn set_extras(&mut self, extra1: u32, extra2: u32) {
        self.header.extra1 = extra1;
        self.header.extra2 = extra2;
    }

    /// Copy of this packet with the command rewritten to ACK.
    pub fn ack(&self) -> Packet {
        let mut ack = self.clone();
        ack.header.command = Command::Ack.into();
        ack
    }

    pub fn into_parts(self) -> (WireHeader, ByteBuffer) {
        (self.header, self.payload)
    }

    /// Total bytes this packet occupies on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Append the wire representation to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_len());
        self.header.encode_into(dst);
        dst.put_slice(self.payload.as_slice());
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_len());
        self.encode_into(&mut dst);
        dst.freeze()
    }

    /// Decode one packet from the front of `src`.
    ///
    /// Returns the packet and the number of bytes consumed, or
    /// `PacketError::Truncated` if `src` does not yet hold a whole packet.
    pub fn decode(src: &[u8], max_payload_size: usize) -> Result<(Packet, usize), PacketError> {
        let header = WireHeader::decode(src).ok_or(PacketError::Truncated {
            needed: HEADER_SIZE,
            available: src.len(),
        })?;
        let length = header.length as usize;
        if length > max_payload_size {
            return Err(PacketError::PayloadTooLarge {
                length,
                max: max_payload_size,
            });
        }
        let total = HEADER_SIZE + length;
        let payload = src.get(HEADER_SIZE..total).ok_or(PacketError::Truncated {
            needed: total,
            available: src.len(),
        })?;
        Ok((Self::from_wire(header, ByteBuffer::copy_from_slice(payload)), total))
    }
}

fn wire_length(len: usize) -> Result<u32, PacketError> {
    u32::try_from(len).map_err(|_| PacketError::PayloadTooLarge {
        length: len,
        max: u32::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LIMIT: usize = usize::MAX;

    #[test]
    fn test_with_command_sets_length() {
        let packet = Packet::with_command(Command::Default, b"hello".to_vec()).unwrap();
        assert_eq!(packet.header().length, 5);
        assert_eq!(packet.header().kind(), Some(Command::Default));
        assert_eq!(packet.payload().as_slice(), b"hello");
    }

    #[test]
    fn test_new_rejects_mismatch() {
        let header = WireHeader::new(Command::Default, 4);
        let err = Packet::new(header, b"hello".to_vec()).unwrap_err();
        assert_eq!(
            err,
            PacketError::LengthMismatch {
                header: 4,
                payload: 5
            }
        );
    }

    #[test]
    fn test_invariant_survives_clone_and_move() {
        let packet = Packet::with_command(Command::Default, vec![7u8; 32]).unwrap();
        let copy = packet.clone();
        let moved = packet;

        for p in [&copy, &moved] {
            assert_eq!(p.header().length as usize, p.payload().len());
        }
        assert_eq!(copy, moved);
    }

    #[test]
    fn test_ack_rewrites_command_only() {
        let mut packet = Packet::with_command(Command::Default, b"data".to_vec()).unwrap();
        packet.set_error(3);
        packet.set_extras(10, 20);

        let ack = packet.ack();
        assert_eq!(ack.header().kind(), Some(Command::Ack));
        assert_eq!(ack.header().length, 4);
        assert_eq!(ack.header().error, 3);
        assert_eq!(ack.header().extra1, 10);
        assert_eq!(ack.header().extra2, 20);
        assert_eq!(ack.payload(), packet.payload());
        // Original untouched
        assert_eq!(packet.header().kind(), Some(Command::Default));
    }

    #[test]
    fn test_encode_decode_lengths() {
        for len in [0usize, 1, 65536] {
            let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut packet = Packet::with_command(Command::Default, payload).unwrap();
            packet.set_extras(len as u32, 99);

            let bytes = packet.to_bytes();
            assert_eq!(bytes.len(), HEADER_SIZE + len);

            let (decoded, consumed) = Packet::decode(&bytes, NO_LIMIT).unwrap();
            assert_eq!(consumed, bytes.len());
            assert_eq!(decoded.header(), packet.header());
            assert_eq!(decoded.payload().as_slice(), packet.payload().as_slice());
        }
    }

    #[test]
    fn test_decode_truncated() {
        let packet = Packet::with_command(Command::Default, b"hello".to_vec()).unwrap();
        let bytes = packet.to_bytes();

        assert_eq!(
            Packet::decode(&bytes[..10], NO_LIMIT).unwrap_err(),
            PacketError::Truncated {
                needed: HEADER_SIZE,
                available: 10
            }
        );
        assert_eq!(
            Packet::decode(&bytes[..HEADER_SIZE + 2], NO_LIMIT).unwrap_err(),
            PacketError::Truncated {
                needed: HEADER_SIZE + 5,
                available: HEADER_SIZE + 2
            }
        );
    }

    #[test]
    fn test_decode_respects_limit() {
        let packet = Packet::with_command(Command::Default, vec![0u8; 100]).unwrap();
        let err = Packet::decode(&packet.to_bytes(), 99).unwrap_err();
        assert_eq!(err, PacketError::PayloadTooLarge { length: 100, max: 99 });
    }

    #[test]
    fn test_decode_back_to_back() {
        let mut buf = BytesMut::new();
        Packet::with_command(Command::Default, b"one".to_vec())
            .unwrap()
            .encode_into(&mut buf);
        Packet::with_command(Command::ReadEof, Vec::new())
            .unwrap()
            .encode_into(&mut buf);

        let (first, used) = Packet::decode(&buf, NO_LIMIT).unwrap();
        let (second, rest) = Packet::decode(&buf[used..], NO_LIMIT).unwrap();
        assert_eq!(first.payload().as_slice(), b"one");
        assert_eq!(second.header().kind(), Some(Command::ReadEof));
        assert_eq!(used + rest, buf.len());
    }
}
