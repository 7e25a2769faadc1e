// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire protocol definitions: message kinds, sensor classes, size bounds.
//!
//! The telemetry protocol is a fixed-header binary format over UDP. Every
//! packet carries a 16-byte header, an optional f32 payload, and a 16-byte
//! MD5 trailer. See [`packet`] for the codec itself.

use serde::{Deserialize, Serialize};

pub mod packet;

pub use packet::{DecodeError, Packet};

/// Protocol version carried in the first header byte.
pub const PROTOCOL_VERSION: u8 = 1;

/// Fixed header length in bytes:
/// version(1) + kind(1) + count(1) + class(1) + device_id(2) + sequence(2) + timestamp(8).
pub const HEADER_LEN: usize = 16;

/// Checksum trailer length in bytes (MD5 digest).
pub const CHECKSUM_LEN: usize = 16;

/// Hard upper bound on total packet size (header + payload + trailer).
pub const MAX_PACKET_LEN: usize = 200;

/// Maximum number of f32 values a Data packet can carry within the bound.
pub const MAX_VALUES: usize = (MAX_PACKET_LEN - HEADER_LEN - CHECKSUM_LEN) / 4;

/// Message kinds understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    /// Handshake request establishing or resuming a device identity.
    Init,
    /// Telemetry readings (one or more f32 values).
    Data,
    /// Liveness-only message, no payload values.
    Heartbeat,
    /// Server reply to an Init, carrying the resolved id and resume sequence.
    HandshakeAck,
}

impl MsgKind {
    /// Map a wire byte to a message kind.
    pub fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Init),
            1 => Some(Self::Data),
            2 => Some(Self::Heartbeat),
            10 => Some(Self::HandshakeAck),
            _ => None,
        }
    }

    /// Wire byte for this kind.
    pub fn to_wire(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Data => 1,
            Self::Heartbeat => 2,
            Self::HandshakeAck => 10,
        }
    }

    /// Human-readable label used in logs and the readings log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Data => "DATA",
            Self::Heartbeat => "HEARTBEAT",
            Self::HandshakeAck => "HANDSHAKE_ACK",
        }
    }
}

/// Physical quantity a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorClass {
    Temperature,
    Humidity,
    Pressure,
}

/// Wire numbering for [`SensorClass`].
///
/// Historical deployments disagreed on whether temperature/humidity/pressure
/// map to {0,1,2} or {1,2,3}. The numbering is an explicit configuration
/// choice; the two schemes are never mixed within one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassNumbering {
    /// temperature=0, humidity=1, pressure=2 (canonical).
    ZeroBased,
    /// temperature=1, humidity=2, pressure=3.
    OneBased,
}

impl Default for ClassNumbering {
    fn default() -> Self {
        Self::ZeroBased
    }
}

impl SensorClass {
    /// All classes, in canonical order.
    pub const ALL: [SensorClass; 3] = [Self::Temperature, Self::Humidity, Self::Pressure];

    /// Map a wire byte to a sensor class under the given numbering.
    pub fn from_wire(raw: u8, numbering: ClassNumbering) -> Option<Self> {
        let index = match numbering {
            ClassNumbering::ZeroBased => raw,
            ClassNumbering::OneBased => raw.checked_sub(1)?,
        };
        match index {
            0 => Some(Self::Temperature),
            1 => Some(Self::Humidity),
            2 => Some(Self::Pressure),
            _ => None,
        }
    }

    /// Wire byte for this class under the given numbering.
    pub fn to_wire(self, numbering: ClassNumbering) -> u8 {
        let index = match self {
            Self::Temperature => 0,
            Self::Humidity => 1,
            Self::Pressure => 2,
        };
        match numbering {
            ClassNumbering::ZeroBased => index,
            ClassNumbering::OneBased => index + 1,
        }
    }

    /// Human-readable label used in logs and the readings log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }
}
