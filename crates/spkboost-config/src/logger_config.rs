//! Logger configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spkboost_core::{BlockLayout, CalibrationSlot};

use crate::ConfigError;

/// Most devices one logger drives.
pub const MAX_ADDRESSES: usize = 4;

/// Settings for a logging run and the device blocks it touches.
///
/// Every field has a default, so a file only needs the values it changes:
///
/// ```toml
/// target = "/dev/i2c-1"
/// addresses = [0x34, 0x35]
/// count = 7200
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Backend target string (`dummy`, `replay:<csv>`, a device path, `host:port`).
    pub target: String,
    /// 7-bit bus addresses of the devices, in channel order.
    pub addresses: Vec<u8>,
    /// Milliseconds between telemetry lines.
    pub interval_ms: u64,
    /// Lines to record; 0 records until stopped.
    pub count: u64,
    /// Lines between model dumps.
    pub model_interval: u64,
    /// Directory for CSV, model logs and `RUN.LOG`.
    pub output_dir: PathBuf,
    /// Prefix of every log file name.
    pub file_prefix: String,
    /// Config and preset block layout of the chip.
    pub layout: BlockLayout,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            target: "dummy".to_string(),
            addresses: vec![0x34],
            interval_ms: 1000,
            count: 0,
            model_interval: 30,
            output_dir: PathBuf::from("."),
            file_prefix: "01".to_string(),
            layout: BlockLayout::default(),
        }
    }
}

impl LoggerConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from the user config directory, or defaults if no file exists there.
    #[cfg(feature = "std")]
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = crate::paths::default_config_path();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: LoggerConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check values that parse but cannot run.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for 0 or more than four addresses, a repeated
    /// address, a zero model interval, an empty file prefix, or a layout
    /// whose slots do not fit their blocks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addresses.is_empty() || self.addresses.len() > MAX_ADDRESSES {
            return Err(ConfigError::Invalid(format!(
                "{} addresses given, expected 1 to {MAX_ADDRESSES}",
                self.addresses.len()
            )));
        }
        for (i, address) in self.addresses.iter().enumerate() {
            if *address > 0x7f {
                return Err(ConfigError::Invalid(format!(
                    "address 0x{address:02x} is not a 7-bit address"
                )));
            }
            if self.addresses[..i].contains(address) {
                return Err(ConfigError::Invalid(format!(
                    "address 0x{address:02x} listed twice"
                )));
            }
        }
        if self.model_interval == 0 {
            return Err(ConfigError::Invalid(
                "model_interval must be at least 1".into(),
            ));
        }
        if self.file_prefix.is_empty() {
            return Err(ConfigError::Invalid("file_prefix is empty".into()));
        }
        for slot in [
            CalibrationSlot::VisCal,
            CalibrationSlot::Vsense,
            CalibrationSlot::Isense,
            CalibrationSlot::AgcGainMax,
        ] {
            let block_len = if slot.in_preset() {
                self.layout.preset_len
            } else {
                self.layout.config_len
            };
            if slot.offset(&self.layout) + 3 > block_len {
                return Err(ConfigError::Invalid(format!(
                    "{slot:?} at offset {} does not fit a {block_len}-byte block",
                    slot.offset(&self.layout)
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(LoggerConfig::from_toml("").unwrap(), LoggerConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = LoggerConfig::from_toml(
            r#"
            target = "/dev/i2c-1"
            addresses = [0x34, 0x35]
            count = 7200

            [layout]
            preset_len = 90
            "#,
        )
        .unwrap();
        assert_eq!(config.target, "/dev/i2c-1");
        assert_eq!(config.addresses, [0x34, 0x35]);
        assert_eq!(config.count, 7200);
        assert_eq!(config.model_interval, 30);
        assert_eq!(config.layout.preset_len, 90);
        assert_eq!(config.layout.config_len, 165);
        assert_eq!(config.layout.agc_gain_max_offset, 39);
    }

    #[test]
    fn address_count_bounds() {
        for addresses in [vec![], vec![0x34, 0x35, 0x36, 0x37, 0x38]] {
            let config = LoggerConfig {
                addresses,
                ..LoggerConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn duplicate_and_wide_addresses() {
        let dup = LoggerConfig {
            addresses: vec![0x34, 0x34],
            ..LoggerConfig::default()
        };
        assert!(dup.validate().is_err());
        let wide = LoggerConfig {
            addresses: vec![0x80],
            ..LoggerConfig::default()
        };
        assert!(wide.validate().is_err());
    }

    #[test]
    fn zero_model_interval() {
        let err = LoggerConfig::from_toml("model_interval = 0").unwrap_err();
        assert!(err.to_string().contains("model_interval"));
    }

    #[test]
    fn agc_slot_must_fit_preset() {
        let config = LoggerConfig {
            layout: BlockLayout {
                preset_len: 41,
                ..BlockLayout::default()
            },
            ..LoggerConfig::default()
        };
        assert!(config.validate().is_err());

        let edge = LoggerConfig {
            layout: BlockLayout {
                preset_len: 42,
                ..BlockLayout::default()
            },
            ..LoggerConfig::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn wrong_type_is_a_parse_error() {
        assert!(matches!(
            LoggerConfig::from_toml("count = \"many\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
