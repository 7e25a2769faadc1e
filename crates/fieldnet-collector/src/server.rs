// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collector core: the blocking single-threaded ingestion loop.
//!
//! One UDP socket, one engine, one writer. The loop fully processes a
//! datagram (engine, ack, persistence, metrics sinks) before blocking on
//! the next receive, so no shared state needs locking. The receive itself
//! has no timeout; the only way out of the loop is process termination.
//!
//! Sink failures are logged and skipped, never fatal: a full disk must not
//! take the protocol engine down with it.

use std::net::{SocketAddr, UdpSocket};

use anyhow::Context;
use tracing::{debug, error, info, warn};

use fieldnet::{Disposition, IngestEngine};

use crate::config::CollectorConfig;
use crate::sink::{MetricsFile, MetricsPush, ReadingLog};

/// Receive buffer size. Larger than the protocol's packet bound so that
/// oversize datagrams arrive whole and classify as Noise rather than being
/// truncated by the socket.
const RECV_BUFFER_LEN: usize = 2048;

/// UDP telemetry collector.
pub struct Collector {
    engine: IngestEngine,
    socket: UdpSocket,
    readings: ReadingLog,
    metrics_file: MetricsFile,
    metrics_push: Option<MetricsPush>,
}

impl Collector {
    /// Bind the socket and open the sinks.
    pub fn new(config: &CollectorConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let bind = SocketAddr::new(config.bind_address, config.port);
        let socket = UdpSocket::bind(bind).with_context(|| format!("binding {}", bind))?;

        let readings = ReadingLog::create(&config.readings_path)
            .with_context(|| format!("creating readings log {:?}", config.readings_path))?;
        let metrics_file = MetricsFile::new(config.metrics_path.clone());

        let metrics_push = match config.metrics_push_addr {
            Some(target) => Some(
                MetricsPush::new(target)
                    .with_context(|| format!("opening metrics push to {}", target))?,
            ),
            None => None,
        };

        Ok(Self {
            engine: IngestEngine::new(config.engine_config()),
            socket,
            readings,
            metrics_file,
            metrics_push,
        })
    }

    /// The bound socket address (useful when binding port 0).
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Run the ingestion loop. Never returns under normal operation.
    pub fn run(&mut self) -> anyhow::Result<()> {
        info!("collector listening on {}", self.socket.local_addr()?);

        let mut buf = [0u8; RECV_BUFFER_LEN];
        loop {
            let (len, src) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) => {
                    error!("receive error: {}", e);
                    continue;
                }
            };

            self.process(&buf[..len], src);
        }
    }

    /// Run one datagram through the engine and the sinks.
    fn process(&mut self, datagram: &[u8], src: SocketAddr) {
        let result = self.engine.ingest(datagram, src);

        if let Disposition::Noise(err) = &result.disposition {
            debug!("dropped noise from {}: {}", src, err);
            return;
        }

        if let Some(ack) = &result.reply {
            if let Err(e) = self.socket.send_to(ack, src) {
                warn!("failed to send handshake ack to {}: {}", src, e);
            }
        }

        if let Some(record) = &result.record {
            if let Err(e) = self.readings.append(record) {
                error!("readings log write failed: {}", e);
            }
        }

        for id in &result.missed_heartbeats {
            warn!("device id={} missed its heartbeat window", id);
        }

        let snapshot = self.engine.snapshot();
        if let Err(e) = self.metrics_file.write(&snapshot) {
            error!("metrics file write failed: {}", e);
        }
        if let Some(push) = &self.metrics_push {
            if let Err(e) = push.push(&snapshot) {
                debug!("metrics push failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldnet::{ClassNumbering, MsgKind, Packet, SensorClass};

    fn collector(dir: &std::path::Path) -> Collector {
        let config = CollectorConfig {
            bind_address: "127.0.0.1".parse().unwrap(),
            port: ephemeral_port(),
            readings_path: dir.join("readings.csv"),
            metrics_path: dir.join("metrics.csv"),
            ..Default::default()
        };
        Collector::new(&config).unwrap()
    }

    fn ephemeral_port() -> u16 {
        // Grab a free port, then release it for the collector to bind.
        let probe = UdpSocket::bind("127.0.0.1:0").unwrap();
        probe.local_addr().unwrap().port()
    }

    fn encode(kind: MsgKind, class: SensorClass, seq: u16, values: Vec<f32>) -> Vec<u8> {
        Packet {
            version: 1,
            kind,
            sensor_class: class,
            device_id: 0,
            sequence: seq,
            timestamp_ms: 1_000,
            values,
        }
        .encode(ClassNumbering::ZeroBased)
    }

    #[test]
    fn test_process_persists_valid_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());
        let src: SocketAddr = "127.0.0.1:40001".parse().unwrap();

        collector.process(&encode(MsgKind::Init, SensorClass::Temperature, 0, vec![]), src);
        collector.process(
            &encode(MsgKind::Data, SensorClass::Temperature, 1, vec![22.5]),
            src,
        );

        let readings = std::fs::read_to_string(dir.path().join("readings.csv")).unwrap();
        let lines: Vec<&str> = readings.lines().collect();
        // Header + the one Data row; the Init is logged, not persisted.
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("temperature,1,1,"));
        assert!(lines[1].contains("22.50"));

        let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        let row = metrics.lines().nth(1).unwrap();
        // Two packets processed.
        assert!(row.split(',').nth(1) == Some("2"));
    }

    #[test]
    fn test_process_drops_noise_without_sink_writes() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());
        let src: SocketAddr = "127.0.0.1:40002".parse().unwrap();

        collector.process(&[1, 2, 3], src);

        let readings = std::fs::read_to_string(dir.path().join("readings.csv")).unwrap();
        assert_eq!(readings.lines().count(), 1);
        // Metrics file untouched: noise never reaches the update stage.
        assert!(!dir.path().join("metrics.csv").exists());
    }

    #[test]
    fn test_process_excludes_corrupted_packet_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());
        let src: SocketAddr = "127.0.0.1:40003".parse().unwrap();

        collector.process(&encode(MsgKind::Init, SensorClass::Humidity, 0, vec![]), src);

        let mut corrupted = encode(MsgKind::Data, SensorClass::Humidity, 1, vec![44.0]);
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        collector.process(&corrupted, src);

        let readings = std::fs::read_to_string(dir.path().join("readings.csv")).unwrap();
        assert_eq!(readings.lines().count(), 1);

        // Still accounted: metrics saw both packets.
        let metrics = std::fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        let row = metrics.lines().nth(1).unwrap();
        assert!(row.split(',').nth(1) == Some("2"));
    }

    #[test]
    fn test_collector_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = CollectorConfig {
            port: 0,
            readings_path: dir.path().join("r.csv"),
            metrics_path: dir.path().join("m.csv"),
            ..Default::default()
        };
        assert!(Collector::new(&config).is_err());
    }

    #[test]
    fn test_live_socket_round_trip() {
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let mut collector = collector(dir.path());
        let addr = collector.local_addr().unwrap();
        let readings_path = dir.path().join("readings.csv");

        std::thread::spawn(move || {
            let _ = collector.run();
        });

        let client = UdpSocket::bind("127.0.0.1:0").unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        // Handshake round trip.
        client
            .send_to(&encode(MsgKind::Init, SensorClass::Pressure, 0, vec![]), addr)
            .unwrap();
        let mut buf = [0u8; 256];
        let (len, _) = client.recv_from(&mut buf).unwrap();
        let ack = Packet::decode(&buf[..len], ClassNumbering::ZeroBased).unwrap();
        assert_eq!(ack.kind, MsgKind::HandshakeAck);
        assert_eq!(ack.device_id, 1);
        assert_eq!(ack.sequence, 0);

        // A data packet lands in the readings log.
        client
            .send_to(
                &encode(MsgKind::Data, SensorClass::Pressure, 1, vec![0.99]),
                addr,
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let content = std::fs::read_to_string(&readings_path).unwrap();
            if content.lines().count() >= 2 {
                assert!(content.contains("0.99"));
                break;
            }
            assert!(Instant::now() < deadline, "data row never appeared");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_new_creates_readings_log_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let collector = collector(dir.path());
        drop(collector);

        let readings = std::fs::read_to_string(dir.path().join("readings.csv")).unwrap();
        assert_eq!(readings.lines().count(), 1);
        assert!(readings.starts_with("sensor_class,"));
    }
}
