// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod cli;
mod config;
mod logging;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::signal;
use tokio::time::interval;
use tracing::{info, warn};

use pansync_core::renderer::NullRenderer;
use pansync_core::{Capability, DeviceRegistry, DynResult, EngineError, ReconnectScheduler, SyncEngine};
use pansync_core::freqlog::FrequencyLog;
use pansync_core::rigcheck::{RigProbe, SdrProbe};

use crate::cli::Cli;
use crate::config::Config;

fn capability_for(name: &str) -> Option<Capability> {
    match name {
        "rig" => Some(Capability::Rig),
        "sdr" => Some(Capability::Sdr),
        "keyboard" => Some(Capability::Keyboard),
        "knob" => Some(Capability::Knob),
        "mouse" => Some(Capability::Mouse),
        other => {
            warn!(device = other, "unknown device name in config, ignoring");
            None
        }
    }
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();
    let config = Config::resolve(&cli)?;
    let _log_guard = logging::init_logging(Some(&config.main.log_level), config.main.logfile_path.as_deref());
    info!(ifreq = ?config.sync.ifreq, rig_port = config.sync.rig_port, sdr_port = config.sync.sdr_port, "starting pansync");

    let mut registry = DeviceRegistry::new(config.devices.enabled.iter().filter_map(|s| capability_for(s)));
    if !cli.daemon {
        // interactive sessions get keyboard nudging even if the config/CLI
        // device list omitted it
        registry.add(Capability::Keyboard);
    }

    let mut engine = SyncEngine::new(&config.sync);
    if let Some(log_path) = &cli.log {
        match FrequencyLog::open(log_path, config.sync.wait_before_log_rigfreq) {
            Ok(log) => engine.attach_freq_log(log),
            Err(e) => {
                let err = EngineError::LogUnavailable(e);
                warn!(error = %err, path = %log_path.display(), "could not open frequency log");
            }
        }
    }
    engine.set_enabled(pansync_core::Role::Rig, registry.enabled(Capability::Rig));
    engine.set_enabled(pansync_core::Role::Sdr, registry.enabled(Capability::Sdr));
    // `cli.no_auto_rig` only concerns whether pansync-app would have started
    // rigctld itself, a supervisor concern out of scope for this crate; it
    // has no effect on sync state, which always starts wanted.
    if cli.no_auto_rig {
        info!("--no-auto-rig: expecting rigctld to already be running");
    }

    let mut scheduler = ReconnectScheduler::new(config.reconnect_scheduler.clone());
    let rig_probe = Mutex::new(RigProbe::new(
        config.rigcheck.hamlib_remote_ip.clone(),
        config.sync.rig_port,
    ));
    scheduler.register(
        "rig_healthcheck",
        std::sync::Arc::new(move || rig_probe.lock().expect("rig probe lock poisoned").check()),
        true,
        true,
    );
    let sdr_probe = Mutex::new(SdrProbe::new(config.sync.sdr_host.clone(), config.sync.sdr_port));
    scheduler.register(
        "sdr_connect",
        std::sync::Arc::new(move || sdr_probe.lock().expect("sdr probe lock poisoned").check()),
        true,
        true,
    );

    let mut renderer = NullRenderer;
    let mut ticker = interval(Duration::from_secs_f64(config.main.interval));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                scheduler.tick();
                engine.reconnect_sockets(now);
                engine.tick(now, &mut renderer);
            }
            _ = signal::ctrl_c() => {
                info!("ctrl-c received, shutting down");
                break;
            }
        }
    }

    scheduler.shutdown();
    engine.shutdown();
    Ok(())
}
