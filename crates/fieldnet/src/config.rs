// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration.
//!
//! The three knobs here are the points where historical deployments
//! disagreed; each is an explicit named choice rather than a silently
//! merged behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::protocol::ClassNumbering;

/// Default silence threshold before a device is reported missing.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(20);

/// Device-id assignment scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdAllocation {
    /// One process-wide monotonically increasing counter (canonical).
    Global,
    /// An independent counter per sensor class.
    PerClass,
}

impl Default for IdAllocation {
    fn default() -> Self {
        Self::Global
    }
}

/// Construction-time options for [`crate::engine::IngestEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Silence threshold applied by the per-packet heartbeat sweep.
    pub heartbeat_timeout: Duration,

    /// Device-id assignment scheme.
    pub id_allocation: IdAllocation,

    /// Wire numbering for the sensor-class byte.
    pub class_numbering: ClassNumbering,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            id_allocation: IdAllocation::default(),
            class_numbering: ClassNumbering::default(),
        }
    }
}
