// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Persistable reading rows.
//!
//! A [`ReadingRecord`] is what the engine hands to the log sink once a
//! packet clears the checksum gate. Exactly one of the three value columns
//! is populated, matching the packet's sensor class: a plain number for a
//! single reading, a comma-joined string for a batch, blank for heartbeats.

use crate::protocol::{MsgKind, Packet, SensorClass};
use crate::registry::DeviceId;

/// One row of the readings log.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRecord {
    pub sensor_class: SensorClass,
    pub device_id: DeviceId,
    pub sequence: u16,
    /// Sender timestamp from the packet, epoch ms.
    pub sent_at_ms: u64,
    /// Server arrival time, epoch ms.
    pub received_at_ms: u64,
    pub kind: MsgKind,
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
    /// Gap size when this arrival classified as Loss, else 0.
    pub loss_gap: u16,
    pub duplicate: bool,
    pub reading_count: u8,
}

impl ReadingRecord {
    /// Build a row from a checksum-valid packet.
    ///
    /// `device_id` is the registry-resolved identity, which may differ from
    /// the id claimed in the packet header.
    pub fn from_packet(
        packet: &Packet,
        device_id: DeviceId,
        received_at_ms: u64,
        loss_gap: u16,
        duplicate: bool,
    ) -> Self {
        let mut record = Self {
            sensor_class: packet.sensor_class,
            device_id,
            sequence: packet.sequence,
            sent_at_ms: packet.timestamp_ms,
            received_at_ms,
            kind: packet.kind,
            temperature: String::new(),
            humidity: String::new(),
            pressure: String::new(),
            loss_gap,
            duplicate,
            reading_count: packet.reading_count(),
        };

        if packet.kind == MsgKind::Data && !packet.values.is_empty() {
            let rendered = format_values(&packet.values);
            match packet.sensor_class {
                SensorClass::Temperature => record.temperature = rendered,
                SensorClass::Humidity => record.humidity = rendered,
                SensorClass::Pressure => record.pressure = rendered,
            }
        }

        record
    }
}

/// Render values with two decimal places, comma-joined for batches.
fn format_values(values: &[f32]) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{:.2}", value));
    }
    out
}
