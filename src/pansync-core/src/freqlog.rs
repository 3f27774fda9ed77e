// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Append-only Rig frequency log, written only after the Rig frequency has
//! been quiet for `wait_before_log_rigfreq` seconds.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;

/// Owns the log file handle and the "quiet since" bookkeeping for one Rig.
pub struct FrequencyLog {
    file: File,
    wait_before_log: f64,
    last_change_at: Option<Instant>,
    last_logged_hz: Option<i64>,
    pending_hz: Option<i64>,
}

impl FrequencyLog {
    /// Open (creating/appending) the log file and write a session header.
    pub fn open(path: &Path, wait_before_log: f64) -> std::io::Result<Self> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "# pansync frequency log — session start {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
        Ok(Self {
            file,
            wait_before_log,
            last_change_at: None,
            last_logged_hz: None,
            pending_hz: None,
        })
    }

    /// Call whenever the engine observes a (possibly repeated) Rig
    /// frequency reading. Starts or restarts the quiet timer only when the
    /// value actually changes from the last one observed.
    pub fn observe(&mut self, now: Instant, rig_hz: i64) {
        if self.pending_hz != Some(rig_hz) {
            self.pending_hz = Some(rig_hz);
            self.last_change_at = Some(now);
        }
    }

    /// Call once per tick after `observe`. Writes a line if the pending
    /// frequency has been quiet for `wait_before_log` seconds and hasn't
    /// already been logged.
    pub fn tick(&mut self, now: Instant) -> std::io::Result<()> {
        let (Some(hz), Some(changed_at)) = (self.pending_hz, self.last_change_at) else {
            return Ok(());
        };
        if self.last_logged_hz == Some(hz) {
            return Ok(());
        }
        if now.duration_since(changed_at).as_secs_f64() < self.wait_before_log {
            return Ok(());
        }
        writeln!(self.file, "{} {hz}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
        self.last_logged_hz = Some(hz);
        Ok(())
    }
}
