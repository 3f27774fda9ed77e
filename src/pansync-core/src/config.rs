// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-module configuration structs, deserialized from the `[sync]`,
//! `[devices]`, `[reconnect_scheduler]`, and `[rigcheck]` sections of the
//! TOML config file. Defaults mirror `spec.md` §6's configuration table.

use serde::{Deserialize, Serialize};

fn default_rig_host() -> String {
    "127.0.0.1".to_string()
}

fn default_sdr_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_rig_port() -> u16 {
    4532
}

const fn default_sdr_port() -> u16 {
    7356
}

const fn default_freq_query_interval() -> f64 {
    0.1
}

const fn default_socket_recon_interval() -> f64 {
    3.0
}

const fn default_timeout() -> f64 {
    2.0
}

const fn default_sync_debounce_time() -> f64 {
    3.0
}

const fn default_wait_before_log_rigfreq() -> f64 {
    5.0
}

const fn default_nudge_buffer() -> i64 {
    10
}

const fn default_read_buffer_size() -> usize {
    1024
}

const fn default_max_read_buffer_bytes() -> usize {
    64 * 1024
}

/// Configuration consumed by [`crate::engine::SyncEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub ifreq: Option<f64>,

    #[serde(default = "default_rig_host")]
    pub rig_host: String,
    #[serde(default = "default_rig_port")]
    pub rig_port: u16,

    #[serde(default = "default_sdr_host")]
    pub sdr_host: String,
    #[serde(default = "default_sdr_port")]
    pub sdr_port: u16,

    #[serde(default = "default_freq_query_interval")]
    pub rig_freq_query_interval: f64,
    #[serde(default = "default_freq_query_interval")]
    pub sdr_freq_query_interval: f64,

    #[serde(default = "default_socket_recon_interval")]
    pub rig_socket_recon_interval: f64,
    #[serde(default = "default_socket_recon_interval")]
    pub sdr_socket_recon_interval: f64,

    #[serde(default = "default_timeout")]
    pub rig_timeout: f64,
    #[serde(default = "default_timeout")]
    pub sdr_timeout: f64,

    #[serde(default = "default_sync_debounce_time")]
    pub sync_debounce_time: f64,

    #[serde(default = "default_wait_before_log_rigfreq")]
    pub wait_before_log_rigfreq: f64,

    #[serde(default = "default_nudge_buffer")]
    pub nudge_buffer: i64,

    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
    #[serde(default = "default_max_read_buffer_bytes")]
    pub max_read_buffer_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ifreq: None,
            rig_host: default_rig_host(),
            rig_port: default_rig_port(),
            sdr_host: default_sdr_host(),
            sdr_port: default_sdr_port(),
            rig_freq_query_interval: default_freq_query_interval(),
            sdr_freq_query_interval: default_freq_query_interval(),
            rig_socket_recon_interval: default_socket_recon_interval(),
            sdr_socket_recon_interval: default_socket_recon_interval(),
            rig_timeout: default_timeout(),
            sdr_timeout: default_timeout(),
            sync_debounce_time: default_sync_debounce_time(),
            wait_before_log_rigfreq: default_wait_before_log_rigfreq(),
            nudge_buffer: default_nudge_buffer(),
            read_buffer_size: default_read_buffer_size(),
            max_read_buffer_bytes: default_max_read_buffer_bytes(),
        }
    }
}

/// Default enabled device set and the single-letter CLI shorthand mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRegisterConfig {
    pub enabled: Vec<String>,
}

impl Default for DeviceRegisterConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "rig".into(),
                "sdr".into(),
                "keyboard".into(),
                "knob".into(),
                "mouse".into(),
            ],
        }
    }
}

const fn default_reconnect_interval() -> f64 {
    3.0
}

const fn default_max_workers() -> usize {
    4
}

const fn default_backoff_cap() -> f64 {
    60.0
}

const fn default_jitter() -> f64 {
    0.10
}

const fn default_slow_threshold() -> f64 {
    1.0
}

/// Configuration consumed by [`crate::scheduler::ReconnectScheduler`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval: f64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_backoff_cap")]
    pub backoff_cap: f64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_slow_threshold")]
    pub slow_threshold: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: default_reconnect_interval(),
            max_workers: default_max_workers(),
            backoff_cap: default_backoff_cap(),
            jitter: default_jitter(),
            slow_threshold: default_slow_threshold(),
        }
    }
}

fn default_hamlib_command() -> String {
    "rigctld -m 4 -r 127.0.0.1:12345 -t 4532".to_string()
}

fn default_hamlib_remote_ip() -> String {
    "127.0.0.1".to_string()
}

/// Configuration consumed by [`crate::rigcheck::RigProbe`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RigCheckConfig {
    #[serde(default = "default_hamlib_command")]
    pub hamlib_command: String,
    #[serde(default = "default_hamlib_remote_ip")]
    pub hamlib_remote_ip: String,
}

impl Default for RigCheckConfig {
    fn default() -> Self {
        Self {
            hamlib_command: default_hamlib_command(),
            hamlib_remote_ip: default_hamlib_remote_ip(),
        }
    }
}
