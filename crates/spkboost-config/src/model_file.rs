//! Speaker models as editable TOML files.
//!
//! `spkboost model export` writes one, a user edits the scalars (or the taps),
//! and `spkboost model write` sends it back to the device.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spkboost_core::{FIR_TAPS, ModelKind, SpeakerModel};

use crate::ConfigError;

/// A speaker model together with the kind it was read as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    /// Which model the taps describe.
    pub kind: ModelKind,
    /// Free-form note, e.g. the device it came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The model.
    pub model: SpeakerModel,
}

impl ModelFile {
    /// Wrap a model.
    pub fn new(kind: ModelKind, model: SpeakerModel) -> Self {
        Self {
            kind,
            description: None,
            model,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Load a model file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if the file does not hold exactly 128 taps.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse TOML text.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let file: ModelFile = toml::from_str(toml_str)?;
        if file.model.fir.len() != FIR_TAPS {
            return Err(ConfigError::Invalid(format!(
                "model has {} FIR taps, expected {FIR_TAPS}",
                file.model.fir.len()
            )));
        }
        Ok(file)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
