//! Process configuration (component H of SPEC_FULL.md), modeled on the
//! teacher's `Config`/`ConfigInner`/`PlayerConfig` (serde + toml,
//! `Default` impls, `fs::read_to_string`/`fs::write`). Loading this from the
//! host's real config path is the host's job (spec.md §1 lists config
//! loading as an external collaborator); the type and its (de)serialization
//! live here because the Scheduler's defaults are keyed off it.

use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Capture parameters used whenever the scheduler starts a Record atom
/// (spec.md §4.E step 3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CaptureConfig {
    pub sample_rate_hz: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub ptime_ms: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16000,
            channels: 1,
            bits_per_sample: 16,
            ptime_ms: 40,
        }
    }
}

/// Everything the scheduler needs that isn't carried by an individual
/// molecule: where the DTMF tone files and play/record targets live, the
/// default capture parameters, and which alert module/device to pass
/// through to the player adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchedulerConfig {
    pub audio_path: PathBuf,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub alert_module: Option<String>,
    #[serde(default)]
    pub alert_device: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            audio_path: PathBuf::from("."),
            capture: CaptureConfig::default(),
            alert_module: None,
            alert_device: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write config file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl SchedulerConfig {
    /// Loads a `SchedulerConfig` from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes this config to `path` as pretty-printed TOML.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capture_matches_spec_defaults() {
        let cfg = CaptureConfig::default();
        assert_eq!(cfg.sample_rate_hz, 16000);
        assert_eq!(cfg.channels, 1);
        assert_eq!(cfg.bits_per_sample, 16);
        assert_eq!(cfg.ptime_ms, 40);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = std::env::temp_dir().join(format!("vqueue-config-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let cfg = SchedulerConfig {
            audio_path: PathBuf::from("/opt/audio"),
            capture: CaptureConfig::default(),
            alert_module: Some("alsa".to_string()),
            alert_device: Some("default".to_string()),
        };
        cfg.write(&path).unwrap();
        let loaded = SchedulerConfig::load(&path).unwrap();
        assert_eq!(cfg, loaded);

        fs::remove_dir_all(&dir).ok();
    }
}
