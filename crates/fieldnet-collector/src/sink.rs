// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output sinks: readings log, metrics file, metrics push.
//!
//! The readings log is append-only CSV with a single header row; opening it
//! truncates any previous run's file. The metrics file is rewritten in full
//! on every update so downstream consumers always read one consistent
//! snapshot. The optional push sink sends the same snapshot as one flat
//! JSON object per UDP datagram.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};

use fieldnet::{MetricsSnapshot, ReadingRecord};

/// Header row of the readings log.
pub const READINGS_HEADER: &str = "sensor_class,device_id,sequence,send_timestamp,arrival_timestamp,msg_kind,temperature,humidity,pressure,loss_gap,duplicate_flag,reading_count";

/// Header row of the metrics file.
pub const METRICS_HEADER: &str = "bytes_per_report,packets_received,duplicate_rate,sequence_gap_count,cpu_ms_per_report,packet_loss,avg_reporting_interval,avg_delay";

/// Append-only CSV readings log.
#[derive(Debug)]
pub struct ReadingLog {
    writer: BufWriter<File>,
}

impl ReadingLog {
    /// Create (truncate) the log and write the header row.
    pub fn create(path: &Path) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", READINGS_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Append one record and flush.
    pub fn append(&mut self, record: &ReadingRecord) -> io::Result<()> {
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            record.sensor_class.label(),
            record.device_id,
            record.sequence,
            record.sent_at_ms,
            record.received_at_ms,
            record.kind.label(),
            csv_field(&record.temperature),
            csv_field(&record.humidity),
            csv_field(&record.pressure),
            record.loss_gap,
            record.duplicate,
            record.reading_count
        )?;
        self.writer.flush()
    }
}

/// Quote a field when it contains a delimiter or quote.
///
/// Batch readings are comma-joined inside a single column, so they must be
/// quoted to keep the row parseable.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Metrics file, rewritten in full per update.
#[derive(Debug)]
pub struct MetricsFile {
    path: PathBuf,
}

impl MetricsFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Replace the file contents with the given snapshot.
    pub fn write(&self, snapshot: &MetricsSnapshot) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writeln!(writer, "{}", METRICS_HEADER)?;
        writeln!(
            writer,
            "{:.2},{},{:.3},{},{:.3},{:.3},{:.3},{:.3}",
            snapshot.bytes_per_report,
            snapshot.packets_received,
            snapshot.duplicate_rate,
            snapshot.sequence_gap_count,
            snapshot.cpu_ms_per_report,
            snapshot.packet_loss_percent,
            snapshot.avg_reporting_interval,
            snapshot.avg_delay
        )?;
        writer.flush()
    }
}

/// UDP push of metrics snapshots to a monitoring consumer.
#[derive(Debug)]
pub struct MetricsPush {
    socket: UdpSocket,
    target: SocketAddr,
}

impl MetricsPush {
    /// Bind an ephemeral socket aimed at `target`.
    pub fn new(target: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self { socket, target })
    }

    /// Send one snapshot as a flat JSON key/value record.
    pub fn push(&self, snapshot: &MetricsSnapshot) -> io::Result<()> {
        let payload = serde_json::to_vec(snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.socket.send_to(&payload, self.target)?;
        Ok(())
    }
}
