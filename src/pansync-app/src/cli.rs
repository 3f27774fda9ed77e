// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::PathBuf;

use clap::Parser;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - ", env!("CARGO_PKG_DESCRIPTION"));

/// Bridges a Rig transceiver controller and an SDR receiver over CAT,
/// keeping their tuned frequencies in sync.
#[derive(Debug, Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = PKG_DESCRIPTION, disable_version_flag = true)]
pub struct Cli {
    /// Print version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: (),

    /// Comma-separated device set to enable at startup (rig,sdr,keyboard,knob,mouse)
    #[arg(short = 'd', long = "devices", value_delimiter = ',')]
    pub devices: Option<Vec<String>>,

    /// Rig CAT TCP port
    #[arg(short = 'r', long = "rig-port")]
    pub rig_port: Option<u16>,

    /// SDR CAT TCP port
    #[arg(short = 's', long = "sdr-port")]
    pub sdr_port: Option<u16>,

    /// Enable IFreq mode with this LO offset in MHz (negative allowed)
    #[arg(short = 'f', long = "ifreq")]
    pub ifreq: Option<f64>,

    /// Require rigctld to already be running, rather than starting it
    /// (accepted for compatibility; this crate never supervises rigctld)
    #[arg(short = 'n', long = "no-auto-rig")]
    pub no_auto_rig: bool,

    /// Enable the frequency log, optionally at a specific path
    #[arg(short = 'l', long = "log", num_args = 0..=1, default_missing_value = "pansync.log")]
    pub log: Option<PathBuf>,

    /// Run headless with no terminal UI
    #[arg(short = 'b', long = "daemon")]
    pub daemon: bool,

    /// Explicit config file path, bypassing the default search tiers
    #[arg(short = 'c', long = "config-file")]
    pub config_file: Option<PathBuf>,
}
