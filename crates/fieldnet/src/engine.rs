// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ingestion engine: one datagram's full journey through the protocol.
//!
//! Per datagram: structural decode -> dispatch by kind -> sequence
//! classification (Init exempt) -> checksum gate -> record construction ->
//! metrics update -> heartbeat sweep. Noise short-circuits straight back to
//! the caller with no state touched, not even the sweep.
//!
//! The engine owns every piece of mutable protocol state (registry,
//! heartbeat monitor, metrics) behind explicit construction; it performs no
//! I/O. The caller feeds it datagrams and acts on the returned [`Ingested`]
//! report: send the ack, persist the record, log the swept devices. Input
//! can never make [`IngestEngine::ingest`] panic or error; expected-invalid
//! datagrams flow through [`Disposition`] values.

use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::heartbeat::HeartbeatMonitor;
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::protocol::{DecodeError, MsgKind, Packet};
use crate::record::ReadingRecord;
use crate::registry::{DeviceId, DeviceRegistry};
use crate::sequence::SeqOutcome;

/// How one datagram was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Structurally invalid; dropped before any state mutation.
    Noise(DecodeError),
    /// Init handled; an ack reply is ready for the caller to send.
    Handshake {
        device_id: DeviceId,
        resume_sequence: u16,
    },
    /// Data or Heartbeat processed through sequence and checksum stages.
    Accepted {
        kind: MsgKind,
        device_id: DeviceId,
        outcome: SeqOutcome,
        checksum_ok: bool,
    },
    /// Structurally valid but not a server-bound kind (stray ack).
    Ignored { kind: MsgKind },
}

/// Result of ingesting one datagram.
#[derive(Debug)]
pub struct Ingested {
    pub disposition: Disposition,
    /// Encoded HandshakeAck to send back to the source endpoint, if any.
    pub reply: Option<Vec<u8>>,
    /// Row for the readings log; present only when the checksum verified
    /// and the kind persists.
    pub record: Option<ReadingRecord>,
    /// Devices whose heartbeat lapsed during this packet's sweep.
    pub missed_heartbeats: Vec<DeviceId>,
}

/// Process-scoped protocol engine.
#[derive(Debug)]
pub struct IngestEngine {
    config: EngineConfig,
    registry: DeviceRegistry,
    heartbeats: HeartbeatMonitor,
    metrics: MetricsAggregator,
}

impl IngestEngine {
    /// Create an engine with empty state.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: DeviceRegistry::new(config.id_allocation),
            heartbeats: HeartbeatMonitor::new(),
            metrics: MetricsAggregator::new(),
            config,
        }
    }

    /// Ingest one datagram, stamping arrival with the current wall clock.
    pub fn ingest(&mut self, datagram: &[u8], src: SocketAddr) -> Ingested {
        self.ingest_at(datagram, src, epoch_ms())
    }

    /// Ingest one datagram with an explicit arrival timestamp (epoch ms).
    ///
    /// The explicit form keeps delay and interval metrics deterministic for
    /// tests and replay tooling; [`IngestEngine::ingest`] is the live path.
    pub fn ingest_at(&mut self, datagram: &[u8], src: SocketAddr, arrival_ms: u64) -> Ingested {
        let started = Instant::now();

        let packet = match Packet::decode(datagram, self.config.class_numbering) {
            Ok(packet) => packet,
            Err(err) => {
                log::debug!("noise datagram from {}: {}", src, err);
                return Ingested {
                    disposition: Disposition::Noise(err),
                    reply: None,
                    record: None,
                    missed_heartbeats: Vec::new(),
                };
            }
        };

        let delay_ms = arrival_ms as f64 - packet.timestamp_ms as f64;
        self.metrics.record_packet(datagram.len(), delay_ms);

        let checksum_ok = Packet::verify_checksum(datagram);
        if !checksum_ok {
            self.metrics.record_checksum_failure();
            log::warn!(
                "checksum mismatch from {} seq={} kind={}",
                src,
                packet.sequence,
                packet.kind.label()
            );
        }

        let mut reply = None;
        let mut record = None;

        let disposition = match packet.kind {
            MsgKind::Init => {
                let (device_id, resume_sequence) =
                    self.registry.register(src, packet.sensor_class);
                self.metrics.record_arrival(device_id, arrival_ms);

                let ack = Packet::handshake_ack(
                    packet.sensor_class,
                    device_id,
                    resume_sequence,
                    arrival_ms,
                );
                reply = Some(ack.encode(self.config.class_numbering));

                log::info!(
                    "handshake: {} {} -> id={} resume={}",
                    src,
                    packet.sensor_class.label(),
                    device_id,
                    resume_sequence
                );
                Disposition::Handshake {
                    device_id,
                    resume_sequence,
                }
            }

            MsgKind::HandshakeAck => {
                log::debug!("ignoring stray handshake ack from {}", src);
                Disposition::Ignored { kind: packet.kind }
            }

            MsgKind::Data | MsgKind::Heartbeat => {
                let device_id = match self.registry.resolve(src, packet.sensor_class) {
                    Some(id) => id,
                    None => {
                        // Unknown pairing: adopt it with a fresh identity.
                        let (id, _) = self.registry.register(src, packet.sensor_class);
                        log::warn!(
                            "unregistered {} device at {}, adopted as id={}",
                            packet.sensor_class.label(),
                            src,
                            id
                        );
                        id
                    }
                };
                self.metrics.record_arrival(device_id, arrival_ms);

                let outcome = self
                    .registry
                    .observe(device_id, packet.sequence)
                    .unwrap_or(SeqOutcome::Fresh);
                match outcome {
                    SeqOutcome::Duplicate => {
                        self.metrics.record_duplicate();
                        log::debug!("duplicate seq={} from id={}", packet.sequence, device_id);
                    }
                    SeqOutcome::Loss { gap } => {
                        self.metrics.record_loss(gap);
                        log::warn!(
                            "loss: {} packets missing before seq={} from id={}",
                            gap,
                            packet.sequence,
                            device_id
                        );
                    }
                    SeqOutcome::Fresh => {}
                }

                if packet.kind == MsgKind::Heartbeat {
                    self.heartbeats.touch(device_id);
                    log::debug!("heartbeat from id={}", device_id);
                }

                if checksum_ok {
                    let loss_gap = match outcome {
                        SeqOutcome::Loss { gap } => gap,
                        _ => 0,
                    };
                    record = Some(ReadingRecord::from_packet(
                        &packet,
                        device_id,
                        arrival_ms,
                        loss_gap,
                        outcome == SeqOutcome::Duplicate,
                    ));
                }

                Disposition::Accepted {
                    kind: packet.kind,
                    device_id,
                    outcome,
                    checksum_ok,
                }
            }
        };

        let missed_heartbeats = self.heartbeats.sweep(self.config.heartbeat_timeout);
        for id in &missed_heartbeats {
            log::warn!("device id={} missed its heartbeat window", id);
        }

        self.metrics
            .record_processing(started.elapsed().as_secs_f64() * 1000.0);

        Ingested {
            disposition,
            reply,
            record,
            missed_heartbeats,
        }
    }

    /// Derive a metrics snapshot from the current totals.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// The running metrics totals.
    pub fn metrics(&self) -> &MetricsAggregator {
        &self.metrics
    }

    /// The device registry.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Direct access to the heartbeat monitor, for liveness inspection.
    pub fn heartbeats(&mut self) -> &mut HeartbeatMonitor {
        &mut self.heartbeats
    }
}

/// Current wall clock as epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
