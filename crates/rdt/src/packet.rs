//! Wire format and packet codec.
//!
//! ```text
//! offset  size  field
//!   0      1    type       (0 = DATA, 1 = ACK)
//!   1      2    seqNum     (big-endian, unsigned 16-bit)
//!   3      N    payload    (US-ASCII, N <= MAX_PAYLOAD)
//! ```

use thiserror::Error;

use crate::seq::SeqNum;

/// Number of bytes used up by the header at the beginning of every datagram.
pub const HEADER_SIZE: usize = 3;
/// Largest payload a single packet may carry.
pub const MAX_PAYLOAD: usize = 1397;
/// Largest packet (header + payload) this crate will ever encode or accept.
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD;

const TYPE_DATA: u8 = 0;
const TYPE_ACK: u8 = 1;

/// A single protocol packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    Data { seq: SeqNum, payload: String },
    Ack { seq: SeqNum },
}

impl Packet {
    pub fn seq(&self) -> SeqNum {
        match self {
            Self::Data { seq, .. } | Self::Ack { seq } => *seq,
        }
    }

    /// Encodes the packet to its wire representation.
    ///
    /// Fails if a DATA payload exceeds [`MAX_PAYLOAD`] bytes.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let (ty, seq, payload): (u8, SeqNum, &[u8]) = match self {
            Self::Data { seq, payload } => (TYPE_DATA, *seq, payload.as_bytes()),
            Self::Ack { seq } => (TYPE_ACK, *seq, &[]),
        };

        if payload.len() > MAX_PAYLOAD {
            return Err(PacketError::PayloadTooLarge(payload.len()));
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
        buf.push(ty);
        buf.extend_from_slice(&seq.get().to_be_bytes());
        buf.extend_from_slice(payload);
        Ok(buf)
    }

    /// Checks that this packet's `seqNum` falls inside `[0, modulus)`, the
    /// range `decode` itself cannot validate since it has no notion of the
    /// connection's window size.
    pub fn validate_seq(&self, modulus: u16) -> Result<(), PacketError> {
        let seq = self.seq().get();
        if seq >= modulus {
            Err(PacketError::SeqOutOfRange(seq, modulus))
        } else {
            Ok(())
        }
    }

    /// Decodes a packet from its wire representation.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_SIZE {
            return Err(PacketError::Truncated(buf.len()));
        }

        let ty = buf[0];
        let seq = SeqNum::new(u16::from_be_bytes([buf[1], buf[2]]));
        let payload = &buf[HEADER_SIZE..];

        match ty {
            TYPE_DATA => {
                if !payload.is_ascii() {
                    return Err(PacketError::NonAscii);
                }
                // `is_ascii` above guarantees this is valid UTF-8.
                let payload = String::from_utf8(payload.to_vec()).expect("payload is ASCII");
                Ok(Self::Data { seq, payload })
            }
            TYPE_ACK => {
                if !payload.is_empty() {
                    return Err(PacketError::AckWithPayload(payload.len()));
                }
                Ok(Self::Ack { seq })
            }
            other => Err(PacketError::UnknownType(other)),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet payload of {0} bytes exceeds the {MAX_PAYLOAD}-byte limit")]
    PayloadTooLarge(usize),
    #[error("packet is only {0} bytes, shorter than the {HEADER_SIZE}-byte header")]
    Truncated(usize),
    #[error("packet payload is not valid US-ASCII")]
    NonAscii,
    #[error("ACK packet carries a {0}-byte payload")]
    AckWithPayload(usize),
    #[error("unknown packet type tag {0}")]
    UnknownType(u8),
    #[error("seqNum {0} is outside the valid [0, {1}) range")]
    SeqOutOfRange(u16, u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_data() {
        let packet = Packet::Data {
            seq: SeqNum::new(42),
            payload: "testing 0".to_string(),
        };
        let encoded = packet.encode().unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE + "testing 0".len());
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_roundtrip_ack() {
        let packet = Packet::Ack {
            seq: SeqNum::new(65535),
        };
        let encoded = packet.encode().unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(Packet::decode(&encoded).unwrap(), packet);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let packet = Packet::Data {
            seq: SeqNum::zero(),
            payload: "x".repeat(MAX_PAYLOAD + 1),
        };
        assert!(matches!(
            packet.encode(),
            Err(PacketError::PayloadTooLarge(n)) if n == MAX_PAYLOAD + 1
        ));
    }

    #[test]
    fn test_decode_rejects_truncated() {
        assert!(matches!(
            Packet::decode(&[0, 1]),
            Err(PacketError::Truncated(2))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        assert!(matches!(
            Packet::decode(&[7, 0, 0]),
            Err(PacketError::UnknownType(7))
        ));
    }

    #[test]
    fn test_decode_rejects_non_ascii_payload() {
        let mut buf = vec![TYPE_DATA, 0, 1];
        buf.extend_from_slice(&[0xff]);
        assert!(matches!(Packet::decode(&buf), Err(PacketError::NonAscii)));
    }

    #[test]
    fn test_decode_rejects_ack_with_payload() {
        let buf = vec![TYPE_ACK, 0, 0, b'x'];
        assert!(matches!(
            Packet::decode(&buf),
            Err(PacketError::AckWithPayload(1))
        ));
    }

    #[test]
    fn test_validate_seq_rejects_out_of_range() {
        let packet = Packet::Ack {
            seq: SeqNum::new(8),
        };
        assert!(matches!(
            packet.validate_seq(8),
            Err(PacketError::SeqOutOfRange(8, 8))
        ));
        assert!(Packet::Ack { seq: SeqNum::new(7) }.validate_seq(8).is_ok());
    }
}
