// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Heartbeat liveness tracking.
//!
//! The monitor records the last heartbeat time per device and reports
//! devices that have gone silent past a timeout. Reporting is single-shot:
//! a swept device is dropped from tracking and will not be reported again
//! until a new heartbeat re-arms it.
//!
//! The sweep runs once per processed packet, not on a wall-clock timer, so
//! detection latency is coupled to overall traffic volume: with no inbound
//! packets at all, no sweep runs and nothing is reported no matter how much
//! time passes. That coupling is part of the protocol's design.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::registry::DeviceId;

/// Per-device last-heartbeat timestamps.
#[derive(Debug, Default)]
pub struct HeartbeatMonitor {
    last_seen: HashMap<DeviceId, Instant>,
}

impl HeartbeatMonitor {
    /// Create an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat from `device_id` now.
    pub fn touch(&mut self, device_id: DeviceId) {
        self.touch_at(device_id, Instant::now());
    }

    /// Record a heartbeat at an explicit instant.
    pub fn touch_at(&mut self, device_id: DeviceId, at: Instant) {
        self.last_seen.insert(device_id, at);
    }

    /// Remove and return every device silent longer than `timeout`.
    ///
    /// Returned ids are sorted for stable log output.
    pub fn sweep(&mut self, timeout: Duration) -> Vec<DeviceId> {
        let mut expired: Vec<DeviceId> = self
            .last_seen
            .iter()
            .filter(|(_, last)| last.elapsed() > timeout)
            .map(|(id, _)| *id)
            .collect();
        expired.sort_unstable();

        for id in &expired {
            self.last_seen.remove(id);
        }
        expired
    }

    /// Number of devices currently tracked.
    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
