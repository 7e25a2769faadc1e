// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Device registry: stable identities for (endpoint, sensor class) pairings.
//!
//! A pairing is assigned a device id on its first handshake and keeps it for
//! the process lifetime; ids are never reused. Re-handshakes resolve to the
//! existing id and a resume sequence derived from the device's sequence
//! window. Records are created lazily and never destroyed.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::config::IdAllocation;
use crate::protocol::SensorClass;
use crate::sequence::{SeqOutcome, SequenceWindow};

/// Stable device identifier, as carried on the wire.
pub type DeviceId = u16;

/// Server-side state for one registered device.
#[derive(Debug, Clone)]
pub struct DeviceEntry {
    pub device_id: DeviceId,
    pub sensor_class: SensorClass,
    pub endpoint: SocketAddr,
    /// Recently seen sequence numbers, bounded FIFO.
    pub window: SequenceWindow,
}

/// Id counter state for the configured allocation scheme.
#[derive(Debug)]
enum IdCounter {
    Global(DeviceId),
    /// One counter per class, indexed in canonical class order.
    PerClass([DeviceId; 3]),
}

impl IdCounter {
    fn new(allocation: IdAllocation) -> Self {
        match allocation {
            IdAllocation::Global => Self::Global(0),
            IdAllocation::PerClass => Self::PerClass([0; 3]),
        }
    }

    fn next(&mut self, class: SensorClass) -> DeviceId {
        let slot = match self {
            Self::Global(next) => next,
            Self::PerClass(counters) => {
                let index = SensorClass::ALL
                    .iter()
                    .position(|c| *c == class)
                    .unwrap_or(0);
                &mut counters[index]
            }
        };
        *slot = slot.wrapping_add(1);
        *slot
    }
}

/// Registry of all devices seen by this process.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, DeviceEntry>,
    /// Pairing index: (endpoint, class) -> id.
    index: HashMap<(SocketAddr, SensorClass), DeviceId>,
    counter: IdCounter,
}

impl DeviceRegistry {
    /// Create an empty registry with the given id scheme.
    pub fn new(allocation: IdAllocation) -> Self {
        Self {
            devices: HashMap::new(),
            index: HashMap::new(),
            counter: IdCounter::new(allocation),
        }
    }

    /// Establish or resume a pairing's identity.
    ///
    /// Unseen pairings get the next id and a resume sequence of 0; known
    /// pairings keep their id and resume from one past the highest sequence
    /// in their window. The handed-out sequence is seeded into the window so
    /// that the device's next send is contiguous for gap arithmetic.
    pub fn register(&mut self, endpoint: SocketAddr, class: SensorClass) -> (DeviceId, u16) {
        if let Some(&device_id) = self.index.get(&(endpoint, class)) {
            if let Some(entry) = self.devices.get_mut(&device_id) {
                let resume = entry.window.resume_sequence();
                entry.window.insert(resume);
                return (device_id, resume);
            }
        }

        let device_id = self.counter.next(class);
        let mut window = SequenceWindow::new();
        window.insert(0);
        self.devices.insert(
            device_id,
            DeviceEntry {
                device_id,
                sensor_class: class,
                endpoint,
                window,
            },
        );
        self.index.insert((endpoint, class), device_id);
        (device_id, 0)
    }

    /// Look up a pairing without creating it.
    pub fn resolve(&self, endpoint: SocketAddr, class: SensorClass) -> Option<DeviceId> {
        self.index.get(&(endpoint, class)).copied()
    }

    /// Run a device's sequence window over an arrival.
    ///
    /// Returns `None` for ids the registry has never issued.
    pub fn observe(&mut self, device_id: DeviceId, seq: u16) -> Option<SeqOutcome> {
        self.devices
            .get_mut(&device_id)
            .map(|entry| entry.window.observe(seq))
    }

    /// Number of registered devices.
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Access a device entry.
    pub fn get(&self, device_id: DeviceId) -> Option<&DeviceEntry> {
        self.devices.get(&device_id)
    }
}
