// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Outbound interface the core publishes toward a terminal UI. The core
//! calls these setters idempotently every tick; a renderer decides on its
//! own whether a call actually changed anything worth redrawing — that
//! dirty-flag bookkeeping is a renderer concern, not the core's.

/// Renderer interface. Implementations may ignore any or all calls (a
/// `--daemon` run wires in a no-op renderer).
pub trait Renderer: Send {
    fn set_sync_mode(&mut self, on: bool);
    fn set_step_value(&mut self, hz: i64);
    fn set_mode(&mut self, label: &str);
    fn set_ifreq(&mut self, mhz: f64);
    fn set_rig(&mut self, freq_hz: Option<i64>, connected: bool);
    fn set_sdr(&mut self, freq_hz: Option<i64>, connected: bool);
    fn set_band_name(&mut self, name: &str);
    fn log(&mut self, line: &str);
    /// Audible cue for a band-step boundary or other out-of-range nudge.
    fn beep(&mut self);
}

/// Renderer that discards every call; used for `--daemon` / non-TTY runs.
#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn set_sync_mode(&mut self, _on: bool) {}
    fn set_step_value(&mut self, _hz: i64) {}
    fn set_mode(&mut self, _label: &str) {}
    fn set_ifreq(&mut self, _mhz: f64) {}
    fn set_rig(&mut self, _freq_hz: Option<i64>, _connected: bool) {}
    fn set_sdr(&mut self, _freq_hz: Option<i64>, _connected: bool) {}
    fn set_band_name(&mut self, _name: &str) {}
    fn log(&mut self, _line: &str) {}
    fn beep(&mut self) {}
}
