// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collector configuration.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fieldnet::{ClassNumbering, EngineConfig, IdAllocation};

/// Collector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Address to bind to (default: 0.0.0.0)
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// UDP port to listen on (default: 9999)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Readings log path (CSV, truncated at startup)
    #[serde(default = "default_readings_path")]
    pub readings_path: PathBuf,

    /// Metrics file path (rewritten in full per update)
    #[serde(default = "default_metrics_path")]
    pub metrics_path: PathBuf,

    /// Optional UDP endpoint to push metrics snapshots to
    #[serde(default)]
    pub metrics_push_addr: Option<SocketAddr>,

    /// Silence threshold before a device is reported missing, seconds
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,

    /// Device-id assignment scheme (global | per_class)
    #[serde(default)]
    pub id_allocation: IdAllocation,

    /// Sensor-class wire numbering (zero_based | one_based)
    #[serde(default)]
    pub class_numbering: ClassNumbering,
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    9999
}

fn default_readings_path() -> PathBuf {
    PathBuf::from("sensor-readings.csv")
}

fn default_metrics_path() -> PathBuf {
    PathBuf::from("metrics.csv")
}

fn default_heartbeat_timeout() -> u64 {
    20
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            readings_path: default_readings_path(),
            metrics_path: default_metrics_path(),
            metrics_push_addr: None,
            heartbeat_timeout_secs: default_heartbeat_timeout(),
            id_allocation: IdAllocation::default(),
            class_numbering: ClassNumbering::default(),
        }
    }
}

impl CollectorConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Get the heartbeat timeout as a Duration.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    /// Build the engine options this config describes.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            heartbeat_timeout: self.heartbeat_timeout(),
            id_allocation: self.id_allocation,
            class_numbering: self.class_numbering,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port cannot be 0".into()));
        }
        if self.heartbeat_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "heartbeat_timeout_secs cannot be 0".into(),
            ));
        }
        if self.readings_path == self.metrics_path {
            return Err(ConfigError::InvalidValue(
                "readings_path and metrics_path must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, Clone)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(s) => write!(f, "I/O error: {}", s),
            Self::ParseError(s) => write!(f, "Parse error: {}", s),
            Self::SerializeError(s) => write!(f, "Serialize error: {}", s),
            Self::InvalidValue(s) => write!(f, "Invalid value: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CollectorConfig::default();
        assert_eq!(config.port, 9999);
        assert_eq!(config.heartbeat_timeout_secs, 20);
        assert_eq!(config.id_allocation, IdAllocation::Global);
        assert_eq!(config.class_numbering, ClassNumbering::ZeroBased);
        assert!(config.metrics_push_addr.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = CollectorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CollectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.port, parsed.port);
        assert_eq!(config.id_allocation, parsed.id_allocation);
    }

    #[test]
    fn test_named_options_parse_from_snake_case() {
        let json = r#"{
            "id_allocation": "per_class",
            "class_numbering": "one_based",
            "heartbeat_timeout_secs": 10
        }"#;
        let config: CollectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.id_allocation, IdAllocation::PerClass);
        assert_eq!(config.class_numbering, ClassNumbering::OneBased);
        assert_eq!(config.heartbeat_timeout_secs, 10);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn test_validation_port_zero() {
        let config = CollectorConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_timeout_zero() {
        let config = CollectorConfig {
            heartbeat_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_colliding_paths() {
        let config = CollectorConfig {
            readings_path: PathBuf::from("same.csv"),
            metrics_path: PathBuf::from("same.csv"),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_config_conversion() {
        let config = CollectorConfig {
            heartbeat_timeout_secs: 45,
            id_allocation: IdAllocation::PerClass,
            ..Default::default()
        };
        let engine = config.engine_config();
        assert_eq!(engine.heartbeat_timeout, Duration::from_secs(45));
        assert_eq!(engine.id_allocation, IdAllocation::PerClass);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.json");

        let config = CollectorConfig {
            port: 7777,
            ..Default::default()
        };
        config.to_file(&path).unwrap();

        let loaded = CollectorConfig::from_file(&path).unwrap();
        assert_eq!(loaded.port, 7777);
    }
}
