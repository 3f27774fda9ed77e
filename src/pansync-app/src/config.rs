// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Top-level configuration: TOML file, discovered from a tiered search path
//! (CWD → XDG config dir → `/etc`) unless an explicit path is given on the
//! command line, then overlaid with CLI flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pansync_core::config::{DeviceRegisterConfig, RigCheckConfig, SchedulerConfig, SyncConfig};

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),
}

fn default_tick_interval() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "INFO".to_string()
}

/// The `[main]` section: ambient settings that don't belong to any one
/// module (main-loop cadence, logging), mirroring
/// `original_source/pansyncer/config.py::MainConfig`. `daemon`/`ifreq`/
/// `no_auto_rig`/`config_file` live on [`crate::cli::Cli`] instead, since
/// those are pure CLI overrides in this repository rather than
/// file-and-CLI-both fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    pub interval: f64,
    pub log_level: String,
    pub logfile_path: Option<PathBuf>,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            interval: default_tick_interval(),
            log_level: default_log_level(),
            logfile_path: None,
        }
    }
}

/// Top-level configuration structure, mirroring the `[main]`, `[sync]`,
/// `[devices]`, `[reconnect_scheduler]`, and `[rigcheck]` sections of the
/// TOML file. `[display]` and `[[knobs]]` sections are accepted but
/// ignored — the renderer and rotary-encoder input are external
/// collaborators this repository doesn't implement (see `spec.md` §1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub main: MainConfig,
    pub sync: SyncConfig,
    pub devices: DeviceRegisterConfig,
    pub reconnect_scheduler: SchedulerConfig,
    pub rigcheck: RigCheckConfig,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    pub fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in Self::default_search_paths() {
            if path.exists() {
                let config = Self::load_from_file(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    pub fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("pansync.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pansync").join("pansync.toml"));
        }
        paths.push(PathBuf::from("/etc/pansync/pansync.toml"));
        paths
    }

    /// Resolve the configuration the CLI actually runs with: load a file
    /// (explicit path, or the first default search path that exists), then
    /// let every explicitly-passed CLI flag override the corresponding
    /// field.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match cli.config_file.as_deref() {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_default_paths()?.0,
        };

        if let Some(rig_port) = cli.rig_port {
            config.sync.rig_port = rig_port;
        }
        if let Some(sdr_port) = cli.sdr_port {
            config.sync.sdr_port = sdr_port;
        }
        if let Some(ifreq) = cli.ifreq {
            config.sync.ifreq = Some(ifreq);
        }
        if let Some(devices) = &cli.devices {
            config.devices.enabled = devices.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.rig_port, 4532);
        assert_eq!(config.sync.sdr_port, 7356);
        assert!(config.sync.ifreq.is_none());
        assert_eq!(config.reconnect_scheduler.max_workers, 4);
    }

    #[test]
    fn parses_minimal_toml() {
        let toml_str = r#"
[sync]
rig_port = 4533
ifreq = 73.295
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sync.rig_port, 4533);
        assert_eq!(config.sync.ifreq, Some(73.295));
        assert_eq!(config.sync.sdr_port, 7356); // untouched default
    }

    #[test]
    fn main_section_defaults_and_overrides() {
        let config = Config::default();
        assert_eq!(config.main.interval, 0.1);
        assert_eq!(config.main.log_level, "INFO");
        assert!(config.main.logfile_path.is_none());

        let toml_str = r#"
[main]
interval = 0.05
log_level = "debug"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.main.interval, 0.05);
        assert_eq!(config.main.log_level, "debug");
    }

    #[test]
    fn unknown_sections_are_ignored_not_rejected() {
        let toml_str = r#"
[display]
small_display = true

[[knobs]]
device = "/dev/input/event3"
"#;
        assert!(toml::from_str::<Config>(toml_str).is_ok());
    }
}
