// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # fieldnet - field telemetry protocol engine
//!
//! Server-side engine for ingesting periodic sensor telemetry over an
//! unreliable datagram transport. The engine assigns stable device
//! identities, detects packet loss, duplication, and corruption, tracks
//! liveness via heartbeats, and maintains running integrity metrics.
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldnet::{EngineConfig, IngestEngine};
//!
//! let mut engine = IngestEngine::new(EngineConfig::default());
//!
//! # let datagram: Vec<u8> = fieldnet::Packet {
//! #     version: fieldnet::protocol::PROTOCOL_VERSION,
//! #     kind: fieldnet::MsgKind::Init,
//! #     sensor_class: fieldnet::SensorClass::Temperature,
//! #     device_id: 0,
//! #     sequence: 0,
//! #     timestamp_ms: 0,
//! #     values: vec![],
//! # }.encode(fieldnet::ClassNumbering::ZeroBased);
//! # let src = "127.0.0.1:9000".parse().unwrap();
//! let result = engine.ingest(&datagram, src);
//! if let Some(ack) = result.reply {
//!     // send `ack` back to `src`
//! }
//! if let Some(record) = result.record {
//!     // append `record` to the readings log
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        IngestEngine                          |
//! |  decode -> dispatch -> sequence check -> checksum -> record  |
//! |                -> metrics update -> heartbeat sweep          |
//! +--------------------------------------------------------------+
//! |  protocol: codec      | registry: identities + windows       |
//! |  heartbeat: liveness  | metrics: running totals + snapshot   |
//! +--------------------------------------------------------------+
//! ```
//!
//! Validation is two-stage: structurally invalid datagrams (Noise) are
//! dropped before touching any state, while checksum failures are fully
//! accounted for sequence, duplicate, and heartbeat purposes and only
//! barred from persistence.
//!
//! The engine is single-threaded by design: one writer, no locks. Callers
//! that fan packets out across threads must shard engines by device or add
//! their own synchronization around the registry, windows, and counters.

pub mod config;
pub mod engine;
pub mod heartbeat;
pub mod metrics;
pub mod protocol;
pub mod record;
pub mod registry;
pub mod sequence;

pub use config::{EngineConfig, IdAllocation, DEFAULT_HEARTBEAT_TIMEOUT};
pub use engine::{epoch_ms, Disposition, Ingested, IngestEngine};
pub use heartbeat::HeartbeatMonitor;
pub use metrics::{MetricsAggregator, MetricsSnapshot};
pub use protocol::{ClassNumbering, DecodeError, MsgKind, Packet, SensorClass};
pub use record::ReadingRecord;
pub use registry::{DeviceId, DeviceRegistry};
pub use sequence::{SeqOutcome, SequenceWindow, WINDOW_CAPACITY};
