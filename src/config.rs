//! Bridge configuration.
//!
//! Handles parsing of `basbridge.toml`: the sink-table layout an embedder
//! builds at startup.
//!
//! ```toml
//! [sinks]
//! slots = 3
//!
//! [[sinks.serial]]
//! slot = 0
//! baud = 115200
//! kind = "console"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sink::{ByteSink, ConsoleSink, MemorySink, SinkError, SinkParams, SinkTable};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("serial slot {slot} outside sink table of {slots}")]
    BadSlot { slot: usize, slots: usize },

    #[error("sink configuration failed: {0}")]
    Sink(#[from] SinkError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const CONFIG_FILE: &str = "basbridge.toml";

/// Root configuration structure matching `basbridge.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    #[serde(default)]
    pub sinks: SinksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinksConfig {
    /// Number of addressable sink slots.
    #[serde(default = "default_slots")]
    pub slots: usize,

    /// Per-slot serial transports.
    #[serde(default)]
    pub serial: Vec<SerialConfig>,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
            serial: Vec::new(),
        }
    }
}

fn default_slots() -> usize {
    crate::sink::DEFAULT_SLOTS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    pub slot: usize,

    #[serde(default = "default_baud")]
    pub baud: u32,

    pub rx_pin: Option<u8>,
    pub tx_pin: Option<u8>,

    /// Transport backing the slot.
    #[serde(default)]
    pub kind: SinkKind,
}

fn default_baud() -> u32 {
    115_200
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Console,
    Memory,
}

impl BridgeConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Err(ConfigError::NotFound(CONFIG_FILE.to_string()));
            }
        }
    }
}

/// Build the injected sink table an embedder hands to
/// [`crate::bindings::Host::new`]. Configured slots are installed and given
/// their transport parameters up front; `serbegin` can still retune them.
pub fn build_sink_table(config: &BridgeConfig) -> ConfigResult<SinkTable> {
    let mut table = SinkTable::with_slots(config.sinks.slots);
    for serial in &config.sinks.serial {
        if serial.slot >= config.sinks.slots {
            return Err(ConfigError::BadSlot {
                slot: serial.slot,
                slots: config.sinks.slots,
            });
        }
        let mut sink: Box<dyn ByteSink> = match serial.kind {
            SinkKind::Console => Box::new(ConsoleSink::new()),
            SinkKind::Memory => Box::new(MemorySink::new()),
        };
        sink.configure(&SinkParams {
            baud: serial.baud,
            pins: serial.rx_pin.zip(serial.tx_pin),
        })?;
        table.install(serial.slot, sink);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let config: BridgeConfig = toml::from_str("").unwrap();
        assert_eq!(config.sinks.slots, crate::sink::DEFAULT_SLOTS);
        assert!(config.sinks.serial.is_empty());
    }

    #[test]
    fn parses_full_layout() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [sinks]
            slots = 2

            [[sinks.serial]]
            slot = 0
            baud = 9600
            kind = "memory"
            rx_pin = 16
            tx_pin = 17

            [[sinks.serial]]
            slot = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.sinks.slots, 2);
        assert_eq!(config.sinks.serial.len(), 2);
        assert_eq!(config.sinks.serial[0].baud, 9600);
        assert_eq!(config.sinks.serial[0].kind, SinkKind::Memory);
        assert_eq!(config.sinks.serial[1].baud, 115_200);
        assert_eq!(config.sinks.serial[1].kind, SinkKind::Console);
    }

    #[test]
    fn builds_table_with_installed_slots() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [[sinks.serial]]
            slot = 1
            kind = "memory"
            "#,
        )
        .unwrap();

        let mut table = build_sink_table(&config).unwrap();
        assert_eq!(table.slot_count(), crate::sink::DEFAULT_SLOTS);
        assert!(table.get_mut(1).is_some());
        assert!(table.get_mut(0).is_none());
    }

    #[test]
    fn rejects_slot_outside_table() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [sinks]
            slots = 1

            [[sinks.serial]]
            slot = 3
            "#,
        )
        .unwrap();

        assert!(matches!(
            build_sink_table(&config),
            Err(ConfigError::BadSlot { slot: 3, slots: 1 })
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = BridgeConfig::load(Path::new("/nonexistent/basbridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
