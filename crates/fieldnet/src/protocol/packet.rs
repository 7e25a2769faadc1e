// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Telemetry packet codec.
//!
//! Wire format (network byte order):
//!
//! ```text
//! 0       1       2       3       4               6               8
//! +-------+-------+-------+-------+---------------+---------------+
//! |version| kind  | count | class |   device_id   |   sequence    |
//! +-------+-------+-------+-------+---------------+---------------+
//! |                     timestamp (u64, epoch ms)                 |
//! +---------------------------------------------------------------+
//! |                 values (count x f32, big-endian)              |
//! +---------------------------------------------------------------+
//! |                    checksum (MD5, 16 bytes)                   |
//! +---------------------------------------------------------------+
//! ```
//!
//! Validation is two-stage. [`Packet::decode`] enforces structure
//! only (sizes, known kind/class); any failure there is Noise and the
//! datagram must be dropped without touching engine state.
//! [`Packet::verify_checksum`] checks integrity separately: a corrupted but
//! structurally valid packet still flows through sequence, duplicate, and
//! heartbeat accounting and is only barred from persistence.

use byteorder::{BigEndian, ByteOrder};
use md5::{Digest, Md5};
use thiserror::Error;

use super::{
    ClassNumbering, MsgKind, SensorClass, CHECKSUM_LEN, HEADER_LEN, MAX_PACKET_LEN,
    PROTOCOL_VERSION,
};

/// Structural decode failures. Every variant classifies as Noise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Datagram shorter than header plus trailer.
    #[error("datagram truncated: {0} bytes")]
    Truncated(usize),

    /// Datagram exceeds the total size bound.
    #[error("datagram exceeds {MAX_PACKET_LEN} byte bound: {0} bytes")]
    Oversize(usize),

    /// Declared value count does not match the actual payload length.
    #[error("payload size mismatch: count {count} implies {expected} bytes, got {actual}")]
    SizeMismatch {
        count: u8,
        expected: usize,
        actual: usize,
    },

    /// Unsupported protocol version byte.
    #[error("unsupported protocol version {0}")]
    BadVersion(u8),

    /// Message kind byte outside the known set.
    #[error("unknown message kind {0}")]
    UnknownKind(u8),

    /// Sensor class byte outside the configured numbering.
    #[error("unknown sensor class {0}")]
    UnknownClass(u8),
}

/// A structurally valid telemetry packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub version: u8,
    pub kind: MsgKind,
    pub sensor_class: SensorClass,
    pub device_id: u16,
    pub sequence: u16,
    /// Sender-side epoch milliseconds.
    pub timestamp_ms: u64,
    pub values: Vec<f32>,
}

impl Packet {
    /// Build a HandshakeAck carrying the resolved identity and resume point.
    pub fn handshake_ack(
        sensor_class: SensorClass,
        device_id: u16,
        resume_sequence: u16,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            kind: MsgKind::HandshakeAck,
            sensor_class,
            device_id,
            sequence: resume_sequence,
            timestamp_ms,
            values: Vec::new(),
        }
    }

    /// Decode a datagram, enforcing structure only.
    ///
    /// The checksum trailer is not inspected here; see
    /// [`Packet::verify_checksum`].
    pub fn decode(bytes: &[u8], numbering: ClassNumbering) -> Result<Self, DecodeError> {
        if bytes.len() > MAX_PACKET_LEN {
            return Err(DecodeError::Oversize(bytes.len()));
        }
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(DecodeError::Truncated(bytes.len()));
        }

        let version = bytes[0];
        if version != PROTOCOL_VERSION {
            return Err(DecodeError::BadVersion(version));
        }

        let kind = MsgKind::from_wire(bytes[1]).ok_or(DecodeError::UnknownKind(bytes[1]))?;
        let count = bytes[2];
        let sensor_class =
            SensorClass::from_wire(bytes[3], numbering).ok_or(DecodeError::UnknownClass(bytes[3]))?;

        let body_len = bytes.len() - CHECKSUM_LEN;
        let expected = HEADER_LEN + count as usize * 4;
        if expected != body_len {
            return Err(DecodeError::SizeMismatch {
                count,
                expected: expected - HEADER_LEN,
                actual: body_len - HEADER_LEN,
            });
        }

        let device_id = BigEndian::read_u16(&bytes[4..6]);
        let sequence = BigEndian::read_u16(&bytes[6..8]);
        let timestamp_ms = BigEndian::read_u64(&bytes[8..16]);

        let mut values = Vec::with_capacity(count as usize);
        let mut offset = HEADER_LEN;
        for _ in 0..count {
            values.push(BigEndian::read_f32(&bytes[offset..offset + 4]));
            offset += 4;
        }

        Ok(Self {
            version,
            kind,
            sensor_class,
            device_id,
            sequence,
            timestamp_ms,
            values,
        })
    }

    /// Encode this packet, appending the MD5 trailer.
    pub fn encode(&self, numbering: ClassNumbering) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + self.values.len() * 4];

        buf[0] = self.version;
        buf[1] = self.kind.to_wire();
        buf[2] = self.values.len() as u8;
        buf[3] = self.sensor_class.to_wire(numbering);
        BigEndian::write_u16(&mut buf[4..6], self.device_id);
        BigEndian::write_u16(&mut buf[6..8], self.sequence);
        BigEndian::write_u64(&mut buf[8..16], self.timestamp_ms);

        let mut offset = HEADER_LEN;
        for value in &self.values {
            BigEndian::write_f32(&mut buf[offset..offset + 4], *value);
            offset += 4;
        }

        let digest = checksum(&buf);
        buf.extend_from_slice(&digest);
        buf
    }

    /// Verify the trailer against the datagram's non-trailer bytes.
    ///
    /// Returns false for datagrams too short to carry a trailer.
    pub fn verify_checksum(bytes: &[u8]) -> bool {
        if bytes.len() < CHECKSUM_LEN {
            return false;
        }
        let split = bytes.len() - CHECKSUM_LEN;
        checksum(&bytes[..split]) == bytes[split..]
    }

    /// Number of payload values declared by this packet.
    pub fn reading_count(&self) -> u8 {
        self.values.len() as u8
    }
}

/// MD5 digest over the packet's non-trailer bytes.
fn checksum(body: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(body);
    hasher.finalize().into()
}
