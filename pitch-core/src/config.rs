//! Session configuration, loadable from and savable to JSON.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PitchError, Result};

/// Default number of samples handed to the estimator per call.
pub const DEFAULT_WINDOW_LENGTH: usize = 1024;

/// Default number of samples of history kept by a streaming source.
pub const DEFAULT_ANALYSIS_SIZE: usize = 2048;

/// Default sample rate requested from a capture device.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Parameters for a [`crate::PitchSession`] and the source feeding it.
///
/// `window_length` and `analysis_size` are independent: the source keeps
/// `analysis_size` samples of history and each estimation reads the newest
/// `window_length` of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Samples per estimation window.
    pub window_length: usize,
    /// Samples of history retained by the source.
    pub analysis_size: usize,
    /// Sample rate to request from a live device, in Hz.
    pub target_sample_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_WINDOW_LENGTH,
            analysis_size: DEFAULT_ANALYSIS_SIZE,
            target_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl SessionConfig {
    /// Checks that the values can drive a session.
    pub fn validate(&self) -> Result<()> {
        if self.window_length < 2 {
            return Err(PitchError::invalid_config(
                "window_length",
                format!("must be at least 2, got {}", self.window_length),
            ));
        }
        if self.analysis_size < self.window_length {
            return Err(PitchError::invalid_config(
                "analysis_size",
                format!(
                    "must not be smaller than window_length ({}), got {}",
                    self.window_length, self.analysis_size
                ),
            ));
        }
        if self.target_sample_rate == 0 {
            return Err(PitchError::invalid_config(
                "target_sample_rate",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: SessionConfig = serde_json::from_str(&data)?;
        config.validate()?;
        debug!("loaded session config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_length, 1024);
        assert_eq!(config.analysis_size, 2048);
    }

    #[test]
    fn rejects_short_window() {
        let config = SessionConfig {
            window_length: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PitchError::InvalidConfig { field: "window_length", .. })
        ));
    }

    #[test]
    fn rejects_history_shorter_than_window() {
        let config = SessionConfig {
            window_length: 4096,
            analysis_size: 2048,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PitchError::InvalidConfig { field: "analysis_size", .. })
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let config = SessionConfig {
            window_length: 2048,
            analysis_size: 4096,
            target_sample_rate: 48000,
        };
        config.save(&path).unwrap();
        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{ "window_length": 512 }"#).unwrap();
        assert_eq!(
            config,
            SessionConfig {
                window_length: 512,
                ..Default::default()
            }
        );
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "target_sample_rate": 0 }"#).unwrap();
        assert!(matches!(
            SessionConfig::load(&path),
            Err(PitchError::InvalidConfig { field: "target_sample_rate", .. })
        ));
    }
}
