// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The sync engine: per-peer CAT socket state machines plus the
//! Direct/IFreq cross-peer synchronization policy.
//!
//! `tick()` never returns `Result` — every failure along the way is logged
//! and recovered locally, per the propagation policy: a CAT peer dropping
//! its socket mid-session must never stop the loop that could reconnect it.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use socket2::{Domain, Socket, Type};
use tracing::{debug, warn};

use crate::band::{BandTable, Direction, StepOutcome};
use crate::cat::{self, Reply};
use crate::config::SyncConfig;
use crate::error::EngineError;
use crate::freqlog::FrequencyLog;
use crate::renderer::Renderer;

/// Which CAT peer a [`PeerState`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Rig,
    Sdr,
}

/// Which peer last drove a sync update, for the debounce window that keeps
/// a single tick's update from being immediately undone by its own echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leader {
    None,
    Rig,
    Sdr,
}

/// Per-peer socket, command pipeline, and frequency bookkeeping.
///
/// `freq_prev` mirrors `freq_cur`'s `None`-until-first-successful-read
/// lifecycle rather than the nominal "Hz" field type: both fields are
/// `None` until a reply has actually been parsed, and both are reset to
/// `None` (not `0`) whenever the peer's socket is torn down, so a fresh
/// connection never looks like a return to 0 Hz.
pub struct PeerState {
    role: Role,
    host: String,
    port: u16,
    enabled: bool,

    sock: Option<TcpStream>,
    recon_interval: Duration,
    recon_at: Option<Instant>,

    freq_cur: Option<i64>,
    freq_prev: Option<i64>,
    freq_sent: Option<i64>,
    freq_delta: i64,
    freq_delta_sent: i64,

    freq_query_interval: Duration,
    send_timestamp: Option<Instant>,
    pending_command: Option<Vec<u8>>,
    in_flight_since: Option<Instant>,
    timeout: Duration,

    recv_buf: Vec<u8>,
    read_buffer_size: usize,
    max_read_buffer_bytes: usize,
}

impl PeerState {
    fn new(
        role: Role,
        host: String,
        port: u16,
        recon_interval: Duration,
        freq_query_interval: Duration,
        timeout: Duration,
        read_buffer_size: usize,
        max_read_buffer_bytes: usize,
    ) -> Self {
        Self {
            role,
            host,
            port,
            enabled: true,
            sock: None,
            recon_interval,
            recon_at: None,
            freq_cur: None,
            freq_prev: None,
            freq_sent: None,
            freq_delta: 0,
            freq_delta_sent: 0,
            freq_query_interval,
            send_timestamp: None,
            pending_command: None,
            in_flight_since: None,
            timeout,
            recv_buf: Vec::new(),
            read_buffer_size,
            max_read_buffer_bytes,
        }
    }

    #[must_use]
    pub fn connected(&self) -> bool {
        self.sock.is_some()
    }

    #[must_use]
    pub fn freq(&self) -> Option<i64> {
        self.freq_cur
    }

    /// Reset every field to its just-constructed default except identity
    /// (host/port/role/enabled/intervals), matching the source's full
    /// per-peer `shutdown` reset.
    fn reset(&mut self) {
        self.sock = None;
        self.recon_at = None;
        self.freq_cur = None;
        self.freq_prev = None;
        self.freq_sent = None;
        self.freq_delta = 0;
        self.freq_delta_sent = 0;
        self.send_timestamp = None;
        self.pending_command = None;
        self.in_flight_since = None;
        self.recv_buf.clear();
    }
}

/// Sync mode: whether the SDR's local oscillator tracks the Rig one-way
/// (IFreq) or both peers mirror each other symmetrically (Direct).
#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncMode {
    Direct,
    IFreq(f64),
}

/// Owns both CAT peer sockets, the Direct/IFreq policy, the band table,
/// and the frequency log. One `SyncEngine` runs the whole sync session.
pub struct SyncEngine {
    rig: PeerState,
    sdr: PeerState,
    mode: SyncMode,

    sync_on: bool,
    wanted_sync: bool,
    leader: Leader,
    leader_at: Option<Instant>,
    sync_debounce: Duration,

    nudge_buffer: i64,
    bands: BandTable,
    freq_log: Option<FrequencyLog>,
    ifreq_announced: bool,

    shutdown: bool,
}

impl SyncEngine {
    #[must_use]
    pub fn new(cfg: &SyncConfig) -> Self {
        let rig = PeerState::new(
            Role::Rig,
            cfg.rig_host.clone(),
            cfg.rig_port,
            Duration::from_secs_f64(cfg.rig_socket_recon_interval),
            Duration::from_secs_f64(cfg.rig_freq_query_interval),
            Duration::from_secs_f64(cfg.rig_timeout),
            cfg.read_buffer_size,
            cfg.max_read_buffer_bytes,
        );
        let sdr = PeerState::new(
            Role::Sdr,
            cfg.sdr_host.clone(),
            cfg.sdr_port,
            Duration::from_secs_f64(cfg.sdr_socket_recon_interval),
            Duration::from_secs_f64(cfg.sdr_freq_query_interval),
            Duration::from_secs_f64(cfg.sdr_timeout),
            cfg.read_buffer_size,
            cfg.max_read_buffer_bytes,
        );
        let mode = match cfg.ifreq {
            Some(mhz) => SyncMode::IFreq(mhz),
            None => SyncMode::Direct,
        };
        Self {
            rig,
            sdr,
            mode,
            sync_on: false,
            wanted_sync: true,
            leader: Leader::None,
            leader_at: None,
            sync_debounce: Duration::from_secs_f64(cfg.sync_debounce_time),
            nudge_buffer: cfg.nudge_buffer,
            bands: BandTable::default(),
            freq_log: None,
            ifreq_announced: false,
            shutdown: false,
        }
    }

    pub fn attach_freq_log(&mut self, log: FrequencyLog) {
        self.freq_log = Some(log);
    }

    #[must_use]
    pub fn rig(&self) -> &PeerState {
        &self.rig
    }

    #[must_use]
    pub fn sdr(&self) -> &PeerState {
        &self.sdr
    }

    pub fn set_enabled(&mut self, role: Role, enabled: bool) {
        let peer = self.peer_mut(role);
        if peer.enabled == enabled {
            return;
        }
        peer.enabled = enabled;
        if !enabled {
            close_socket(peer);
            peer.reset();
        }
    }

    /// Bump `role`'s pending frequency by `step_hz * delta_steps`, refusing
    /// to accumulate more than `step_hz * nudge_buffer` ahead of the
    /// last-known frequency.
    pub fn nudge(&mut self, step_hz: i64, delta_steps: i64) {
        let cap = step_hz.unsigned_abs() as i64 * self.nudge_buffer;
        self.apply_delta_hz(step_hz * delta_steps, cap);
    }

    /// Bump the current nudge leader's pending frequency by `delta_hz`,
    /// refusing to accumulate past `cap` in either direction.
    fn apply_delta_hz(&mut self, delta_hz: i64, cap: i64) {
        let Some(peer) = self.leader_for_nudge() else {
            return;
        };
        let candidate = peer.freq_delta + delta_hz;
        if candidate.abs() > cap {
            return;
        }
        peer.freq_delta = candidate;
    }

    /// The peer a manual nudge applies to: Rig if live and enabled, else
    /// SDR if live and enabled, else no-op. Mirrors the source's
    /// rig-then-gqrx preference order.
    fn leader_for_nudge(&mut self) -> Option<&mut PeerState> {
        if self.rig.enabled && self.rig.sock.is_some() {
            return Some(&mut self.rig);
        }
        if self.sdr.enabled && self.sdr.sock.is_some() {
            return Some(&mut self.sdr);
        }
        None
    }

    pub fn set_sync_mode(&mut self, wanted: bool) {
        self.wanted_sync = wanted;
        let effective = wanted && self.rig.sock.is_some() && self.sdr.sock.is_some();
        self.sync_on = effective;
    }

    pub fn set_band_step(&mut self, direction: Direction, step_hz: i64, renderer: &mut dyn Renderer) {
        let Some(freq_hz) = self.rig.freq_cur else {
            return;
        };
        let freq_mhz = freq_hz as f64 / 1_000_000.0;
        match self.bands.step(freq_mhz, direction) {
            StepOutcome::Goto(target_mhz) => {
                let target_hz = (target_mhz * 1_000_000.0).round() as i64;
                let cap = step_hz.unsigned_abs() as i64 * self.nudge_buffer;
                self.apply_delta_hz(target_hz - freq_hz, cap);
            }
            StepOutcome::Boundary => renderer.beep(),
        }
    }

    fn peer_mut(&mut self, role: Role) -> &mut PeerState {
        match role {
            Role::Rig => &mut self.rig,
            Role::Sdr => &mut self.sdr,
        }
    }

    /// Drive one cycle: per-peer socket I/O for both roles, then the
    /// cross-peer policy, frequency logging, and renderer updates.
    ///
    /// Matches the source's ordering exactly: per-role processing
    /// (poll-error check, read, write, query/set arbitration, reconnect,
    /// timeout sweep) for Rig then SDR, followed by once-per-tick
    /// cross-peer bookkeeping (apply-sync-actions, sync-state update,
    /// band update, renderer update).
    pub fn tick(&mut self, now: Instant, renderer: &mut dyn Renderer) {
        if self.shutdown {
            return;
        }

        tick_peer(&mut self.rig, now, self.mode);
        tick_peer(&mut self.sdr, now, self.mode);

        self.apply_sync_policy(now);
        self.update_sync_state();

        if let (Some(log), Some(hz)) = (self.freq_log.as_mut(), self.rig.freq_cur) {
            log.observe(now, hz);
            if let Err(e) = log.tick(now) {
                warn!(error = %e, "frequency log write failed");
            }
        }

        self.update_renderer(renderer);
    }

    /// Direct/IFreq cross-peer policy, run once per tick after both peers'
    /// I/O has settled. Single leader per tick: Rig is checked first, and
    /// only if it did not just change do we consider the SDR as leader.
    fn apply_sync_policy(&mut self, now: Instant) {
        let rig_changed = self.rig.freq_cur != self.rig.freq_prev;
        let sdr_changed = self.sdr.freq_cur != self.sdr.freq_prev;

        let partner_known = match self.mode {
            SyncMode::Direct => self.sdr.freq_cur.is_some(),
            SyncMode::IFreq(_) => true,
        };
        let runnable = self.sync_on
            && self.rig.sock.is_some()
            && self.sdr.sock.is_some()
            && self.rig.enabled
            && self.sdr.enabled
            && self.rig.freq_cur.is_some()
            && partner_known;

        if !runnable {
            return;
        }

        match self.mode {
            SyncMode::Direct => {
                if rig_changed {
                    if !(self.leader == Leader::Sdr && within_debounce(self.leader_at, now, self.sync_debounce)) {
                        self.leader = Leader::Rig;
                        self.leader_at = Some(now);
                        self.rig.freq_prev = self.rig.freq_cur;
                        let target = self.rig.freq_cur.expect("checked above");
                        self.sdr.freq_sent = Some(target);
                        self.sdr.pending_command = Some(cat::set_freq(target));
                    }
                } else if sdr_changed {
                    if !(self.leader == Leader::Rig && within_debounce(self.leader_at, now, self.sync_debounce)) {
                        self.leader = Leader::Sdr;
                        self.leader_at = Some(now);
                        self.sdr.freq_prev = self.sdr.freq_cur;
                        let target = self.sdr.freq_cur.expect("checked above");
                        self.rig.freq_sent = Some(target);
                        self.rig.pending_command = Some(cat::set_freq(target));
                    }
                }
            }
            SyncMode::IFreq(mhz) => {
                if rig_changed {
                    let rig_hz = self.rig.freq_cur.expect("checked above");
                    let lo_hz = rig_hz - (mhz * 1_000_000.0).abs().round() as i64;
                    if Some(lo_hz) != self.sdr.freq_cur {
                        self.rig.freq_prev = self.rig.freq_cur;
                        self.sdr.freq_sent = Some(lo_hz);
                        self.sdr.pending_command = Some(cat::set_lo(lo_hz));
                    }
                }
            }
        }
    }

    /// Sync is forced off the instant either socket drops, and only comes
    /// back on its own once both are live again and the user still wants it.
    fn update_sync_state(&mut self) {
        if self.rig.sock.is_none() || self.sdr.sock.is_none() {
            self.sync_on = false;
        } else if self.wanted_sync && !self.sync_on {
            self.sync_on = true;
        }
    }

    fn update_renderer(&mut self, renderer: &mut dyn Renderer) {
        renderer.set_sync_mode(self.sync_on);
        renderer.set_rig(self.rig.freq_cur, self.rig.connected());
        renderer.set_sdr(self.sdr.freq_cur, self.sdr.connected());
        if let Some(hz) = self.rig.freq_cur {
            renderer.set_band_name(self.bands.name_for(hz as f64 / 1_000_000.0));
        }
        match self.mode {
            SyncMode::Direct => renderer.set_mode("Direct"),
            SyncMode::IFreq(mhz) => {
                renderer.set_mode("IFreq");
                // set_ifreq is a configuration-time announcement, not a
                // per-tick status update — the offset never changes after
                // construction, so the renderer only needs to hear it once.
                if !self.ifreq_announced {
                    renderer.set_ifreq(mhz);
                    self.ifreq_announced = true;
                }
            }
        }
    }

    /// Connect or close each peer's socket as its `enabled` flag and
    /// reconnect deadline dictate. Called once per tick by the caller
    /// alongside `tick()`, mirroring the source's `reconnect_socket`.
    pub fn reconnect_sockets(&mut self, now: Instant) {
        reconnect_peer(&mut self.rig, now);
        reconnect_peer(&mut self.sdr, now);
    }

    /// Full shutdown: close both sockets, reset both peers, and stop
    /// answering future `tick()` calls.
    pub fn shutdown(&mut self) {
        self.shutdown = true;
        close_socket(&mut self.rig);
        self.rig.reset();
        close_socket(&mut self.sdr);
        self.sdr.reset();
    }
}

fn within_debounce(leader_at: Option<Instant>, now: Instant, debounce: Duration) -> bool {
    match leader_at {
        Some(t) => now.duration_since(t) < debounce,
        None => false,
    }
}

/// One peer's full per-tick state machine, matching the source's ordering:
/// poll-error check, read, write, ensure-query-pending, periodic query,
/// pending-delta set, and in-flight timeout sweep.
fn tick_peer(peer: &mut PeerState, now: Instant, mode: SyncMode) {
    if peer.sock.is_none() {
        return;
    }
    match peer.sock.as_ref().expect("checked above").take_error() {
        Ok(None) => {}
        Ok(Some(e)) | Err(e) => {
            let err = EngineError::SocketError(peer.role, e);
            warn!(error = %err, "socket poll error");
            close_socket(peer);
            return;
        }
    }

    process_incoming(peer);
    if peer.sock.is_none() {
        return;
    }
    send_pending_command(peer, now);
    if peer.sock.is_none() {
        return;
    }

    ensure_initial_query(peer, mode);
    if peer.pending_command.is_none() {
        maybe_query(peer, now, mode);
    }
    maybe_apply_delta(peer);
    check_in_flight_timeout(peer, now);
}

/// While this peer's frequency has never been learned, keep a discovery
/// query queued every tick regardless of in-flight state — the SDR's LO
/// query in IFreq mode, the plain frequency query otherwise. This is the
/// one case where IFreq mode still queries the SDR: discovering its
/// starting LO before `apply_sync_policy` can treat the peer as known.
fn ensure_initial_query(peer: &mut PeerState, mode: SyncMode) {
    if peer.freq_cur.is_some() {
        return;
    }
    peer.pending_command = Some(if peer.role == Role::Sdr && matches!(mode, SyncMode::IFreq(_)) {
        cat::query_lo()
    } else {
        cat::query_freq()
    });
}

/// Drain any available bytes, buffer them, and classify each complete
/// line. An unsolicited reply (no command currently in flight) is logged
/// and discarded outright, without being appended to `recv_buf` at all.
fn process_incoming(peer: &mut PeerState) {
    let Some(sock) = peer.sock.as_mut() else {
        return;
    };

    let mut buf = vec![0u8; peer.read_buffer_size];
    let n = match sock.read(&mut buf) {
        Ok(0) => {
            debug!(role = ?peer.role, "peer closed connection");
            close_socket(peer);
            return;
        }
        Ok(n) => n,
        Err(e) if e.kind() == ErrorKind::WouldBlock => return,
        Err(e) => {
            let err = EngineError::SocketError(peer.role, e);
            warn!(error = %err, "read failed");
            close_socket(peer);
            return;
        }
    };

    if peer.in_flight_since.is_none() {
        debug!(role = ?peer.role, "unsolicited reply, discarding");
        return;
    }

    peer.recv_buf.extend_from_slice(&buf[..n]);
    if peer.recv_buf.len() > peer.max_read_buffer_bytes {
        let excess = peer.recv_buf.len() - peer.max_read_buffer_bytes;
        peer.recv_buf.drain(..excess);
    }

    let (lines, tail) = cat::split_lines(&peer.recv_buf);
    if lines.is_empty() {
        return;
    }

    for line in &lines {
        if line.is_empty() {
            continue;
        }
        match cat::parse_reply(line) {
            Reply::Ack => {
                if let Some(sent) = peer.freq_sent.take() {
                    peer.freq_prev = Some(sent);
                    peer.freq_cur = Some(sent);
                    peer.freq_delta -= peer.freq_delta_sent;
                    peer.freq_delta_sent = 0;
                }
            }
            Reply::Nack(code) => {
                let err = EngineError::ProtocolError(peer.role, format!("RPRT {code}"));
                warn!(error = %err, "peer rejected set command");
                peer.freq_sent = None;
                peer.freq_delta = 0;
            }
            Reply::Integer(freq) => {
                if Some(freq) != peer.freq_prev {
                    peer.freq_prev = peer.freq_cur;
                    peer.freq_cur = Some(freq);
                }
            }
            Reply::Malformed => {
                let err = EngineError::ProtocolError(peer.role, line.clone());
                warn!(error = %err, "malformed reply");
                peer.freq_sent = None;
                peer.freq_delta = 0;
            }
        }
    }

    peer.recv_buf = tail;
    peer.in_flight_since = None;
}

fn send_pending_command(peer: &mut PeerState, now: Instant) {
    let Some(cmd) = peer.pending_command.as_ref() else {
        return;
    };
    let Some(sock) = peer.sock.as_mut() else {
        return;
    };
    match sock.write_all(cmd) {
        Ok(()) => {
            peer.in_flight_since = Some(now);
            peer.send_timestamp = Some(now);
            peer.pending_command = None;
        }
        Err(e) if e.kind() == ErrorKind::WouldBlock => {}
        Err(e) => {
            let err = EngineError::SocketError(peer.role, e);
            warn!(error = %err, "write failed");
            close_socket(peer);
        }
    }
}

/// Issue a periodic frequency query, unless one is already pending, a
/// reply is already in flight, or (for the SDR, in IFreq mode) queries are
/// skipped because the engine never re-reads the SDR's own LO after the
/// initial discovery in [`ensure_initial_query`].
fn maybe_query(peer: &mut PeerState, now: Instant, mode: SyncMode) {
    if peer.sock.is_none() || peer.in_flight_since.is_some() {
        return;
    }
    if peer.role == Role::Sdr && matches!(mode, SyncMode::IFreq(_)) {
        return;
    }
    let due = peer
        .send_timestamp
        .map_or(true, |t| now.duration_since(t) >= peer.freq_query_interval);
    if !due {
        return;
    }
    peer.pending_command = Some(cat::query_freq());
}

/// Turn an accumulated manual nudge into a `F <hz>` command, unless the
/// peer is disabled, a reply is already in flight, or there's nothing to
/// send (no pending delta and no delta already in flight).
fn maybe_apply_delta(peer: &mut PeerState) {
    if !peer.enabled || peer.sock.is_none() || peer.in_flight_since.is_some() {
        return;
    }
    let Some(cur) = peer.freq_cur else {
        return;
    };
    if peer.freq_delta == 0 && peer.freq_sent.is_none() {
        return;
    }
    let target = cur + peer.freq_delta;
    peer.freq_delta_sent = peer.freq_delta;
    peer.freq_sent = Some(target);
    peer.pending_command = Some(cat::set_freq(target));
}

fn check_in_flight_timeout(peer: &mut PeerState, now: Instant) {
    let Some(started) = peer.in_flight_since else {
        return;
    };
    if now.duration_since(started) > peer.timeout {
        warn!(role = ?peer.role, "reply timed out");
        peer.in_flight_since = None;
        peer.freq_sent = None;
        peer.freq_delta_sent = 0;
        peer.freq_delta = 0;
    }
}

fn reconnect_peer(peer: &mut PeerState, now: Instant) {
    if peer.enabled && peer.sock.is_none() {
        let due = peer.recon_at.map_or(true, |t| now.duration_since(t) > peer.recon_interval);
        if due {
            peer.recon_at = Some(now);
            match connect_nonblocking(&peer.host, peer.port) {
                Ok(sock) => {
                    debug!(role = ?peer.role, host = %peer.host, port = peer.port, "connected");
                    peer.sock = Some(sock);
                }
                Err(e) => {
                    debug!(role = ?peer.role, error = %e, "connect failed");
                }
            }
        }
    } else if !peer.enabled && peer.sock.is_some() {
        close_socket(peer);
    }
}

fn close_socket(peer: &mut PeerState) {
    peer.sock = None;
    peer.recv_buf.clear();
    peer.pending_command = None;
    peer.in_flight_since = None;
    peer.send_timestamp = None;
    peer.sync_reset_on_close();
}

impl PeerState {
    /// Zeroes the fields the source's `_cleanup_socket` clears even though
    /// the rest of the peer's identity (host/port/enabled/intervals)
    /// survives a socket loss, so a later reconnect starts from a known
    /// "nothing learned yet" state.
    fn sync_reset_on_close(&mut self) {
        self.freq_sent = None;
        self.freq_delta = 0;
        self.freq_delta_sent = 0;
    }
}

/// Resolve `host:port` and open a non-blocking TCP connection to it.
/// `std::net::TcpStream` has no non-blocking connect of its own, so the
/// socket is built and put in non-blocking mode via `socket2` before the
/// connect attempt; an in-progress (`WouldBlock`) connect is treated the
/// same as success here and surfaces as a later read/write failure if it
/// never completes — matching the source's fire-and-forget reconnects.
fn connect_nonblocking(host: &str, port: u16) -> std::io::Result<TcpStream> {
    let addr: SocketAddr = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(ErrorKind::AddrNotAvailable, "no address resolved"))?;

    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;
    match socket.connect(&addr.into()) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::WouldBlock || e.raw_os_error() == Some(libc_in_progress()) => {}
        Err(e) => return Err(e),
    }
    let stream: TcpStream = socket.into();
    stream.set_nonblocking(true)?;
    Ok(stream)
}

/// `EINPROGRESS` on Linux, the errno a non-blocking `connect(2)` returns
/// while the handshake is still underway. `socket2`/std map this to an
/// `io::Error` without a portable `ErrorKind`, so the raw code is checked
/// directly.
const fn libc_in_progress() -> i32 {
    115
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    struct RecordingRenderer {
        bands: Vec<String>,
        beeps: u32,
        ifreq_calls: u32,
    }

    impl RecordingRenderer {
        fn new() -> Self {
            Self { bands: Vec::new(), beeps: 0, ifreq_calls: 0 }
        }
    }

    impl Renderer for RecordingRenderer {
        fn set_sync_mode(&mut self, _on: bool) {}
        fn set_step_value(&mut self, _hz: i64) {}
        fn set_mode(&mut self, _label: &str) {}
        fn set_ifreq(&mut self, _mhz: f64) {
            self.ifreq_calls += 1;
        }
        fn set_rig(&mut self, _freq_hz: Option<i64>, _connected: bool) {}
        fn set_sdr(&mut self, _freq_hz: Option<i64>, _connected: bool) {}
        fn set_band_name(&mut self, name: &str) {
            self.bands.push(name.to_string());
        }
        fn log(&mut self, _line: &str) {}
        fn beep(&mut self) {
            self.beeps += 1;
        }
    }

    /// Spawns a line-oriented CAT stub server: `f`/`LNB_LO` queries get a
    /// fixed reply, `F <hz>`/`LNB_LO <hz>` sets get `RPRT 0`, and every
    /// received line is also forwarded out over `tx` for assertions.
    fn spawn_stub(initial_hz: i64) -> (u16, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let trimmed = line.trim();
                let _ = tx.send(trimmed.to_string());
                if trimmed == "f" || trimmed == "LNB_LO" {
                    writeln!(writer, "{initial_hz}").unwrap();
                } else if trimmed.starts_with('F') || trimmed.starts_with("LNB_LO") {
                    writeln!(writer, "RPRT 0").unwrap();
                }
            }
        });
        (port, rx)
    }

    fn cfg(rig_port: u16, sdr_port: u16) -> SyncConfig {
        SyncConfig {
            rig_host: "127.0.0.1".into(),
            rig_port,
            sdr_host: "127.0.0.1".into(),
            sdr_port,
            rig_freq_query_interval: 0.0,
            sdr_freq_query_interval: 0.0,
            ..Default::default()
        }
    }

    fn wait_for<F: FnMut() -> bool>(mut pred: F) {
        for _ in 0..200 {
            if pred() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("condition never became true");
    }

    #[test]
    fn direct_mode_rig_change_drives_sdr_set_command() {
        let (rig_port, rig_rx) = spawn_stub(14_200_000);
        let (sdr_port, sdr_rx) = spawn_stub(7_100_000);
        let mut engine = SyncEngine::new(&cfg(rig_port, sdr_port));
        let mut renderer = RecordingRenderer::new();

        wait_for_both_connected(&mut engine, &mut renderer);
        engine.set_sync_mode(true);

        // drain the initial "f" queries and their replies
        wait_for(|| {
            engine.tick(Instant::now(), &mut renderer);
            engine.rig.freq_cur == Some(14_200_000) && engine.sdr.freq_cur == Some(7_100_000)
        });

        wait_for(|| rig_rx.try_recv().is_ok());
        wait_for(|| sdr_rx.try_recv().is_ok());

        // run enough ticks for apply_sync_policy to notice the rig's value
        // and push it to the SDR
        for _ in 0..20 {
            engine.tick(Instant::now(), &mut renderer);
        }
        wait_for(|| sdr_rx.try_iter().any(|l| l == "F 14200000"));
    }

    #[test]
    fn ifreq_mode_computes_lo_one_way() {
        let (rig_port, _rig_rx) = spawn_stub(14_200_000);
        let (sdr_port, sdr_rx) = spawn_stub(-59_095_000);
        let mut cfg = cfg(rig_port, sdr_port);
        cfg.ifreq = Some(73.295);
        let mut engine = SyncEngine::new(&cfg);
        let mut renderer = RecordingRenderer::new();

        wait_for_both_connected(&mut engine, &mut renderer);
        engine.set_sync_mode(true);

        wait_for(|| {
            engine.tick(Instant::now(), &mut renderer);
            engine.rig.freq_cur == Some(14_200_000)
        });

        for _ in 0..20 {
            engine.tick(Instant::now(), &mut renderer);
        }
        wait_for(|| sdr_rx.try_iter().any(|l| l == "LNB_LO -59095000"));
        assert_eq!(renderer.ifreq_calls, 1);
    }

    #[test]
    fn ifreq_mode_never_requeries_sdr_after_initial_lo_discovery() {
        let (rig_port, _rig_rx) = spawn_stub(14_200_000);
        let (sdr_port, sdr_rx) = spawn_stub(-59_095_000);
        let mut cfg = cfg(rig_port, sdr_port);
        cfg.ifreq = Some(73.295);
        let mut engine = SyncEngine::new(&cfg);
        let mut renderer = RecordingRenderer::new();

        wait_for_both_connected(&mut engine, &mut renderer);
        wait_for(|| {
            engine.tick(Instant::now(), &mut renderer);
            engine.sdr.freq_cur == Some(-59_095_000)
        });

        // drain the bootstrap LO discovery query (and any retries sent
        // before its reply landed)
        let _ = sdr_rx.try_iter().count();

        for _ in 0..20 {
            engine.tick(Instant::now(), &mut renderer);
        }
        assert!(sdr_rx.try_iter().all(|l| l != "LNB_LO" && l != "f"));
    }

    #[test]
    fn nudge_is_dropped_when_no_peer_socket_is_live() {
        let mut engine = SyncEngine::new(&cfg(0, 0));
        engine.nudge(100, 1);
        assert_eq!(engine.rig.freq_delta, 0);
        assert_eq!(engine.sdr.freq_delta, 0);
    }

    #[test]
    fn nudge_is_capped_by_step_times_buffer() {
        let (rig_port, _rx) = spawn_stub(14_200_000);
        let mut engine = SyncEngine::new(&cfg(rig_port, 0));
        engine.rig.sock = Some(TcpStream::connect(("127.0.0.1", rig_port)).unwrap());
        engine.rig.sock.as_mut().unwrap().set_nonblocking(true).unwrap();

        for _ in 0..3 {
            engine.nudge(100, 1); // cap is 100 * nudge_buffer(10) = 1000
        }
        assert_eq!(engine.rig.freq_delta, 300);
        engine.nudge(100, 100); // way over cap, rejected outright
        assert_eq!(engine.rig.freq_delta, 300);
    }

    #[test]
    fn nudge_reconciles_against_rprt_0_ack() {
        let (rig_port, rig_rx) = spawn_stub(14_200_000);
        let mut engine = SyncEngine::new(&cfg(rig_port, 0));
        let mut renderer = RecordingRenderer::new();

        wait_for(|| {
            engine.reconnect_sockets(Instant::now());
            engine.tick(Instant::now(), &mut renderer);
            engine.rig.sock.is_some()
        });
        wait_for(|| {
            engine.tick(Instant::now(), &mut renderer);
            engine.rig.freq_cur == Some(14_200_000)
        });
        let _ = rig_rx.try_iter().count(); // drain the bootstrap query/reply

        engine.nudge(100, 10);
        assert_eq!(engine.rig.freq_delta, 1000);

        wait_for(|| {
            engine.tick(Instant::now(), &mut renderer);
            engine.rig.freq_delta == 0
        });
        wait_for(|| rig_rx.try_iter().any(|l| l == "F 14201000"));
        assert_eq!(engine.rig.freq_cur, Some(14_201_000));
        assert_eq!(engine.rig.freq_delta_sent, 0);
    }

    #[test]
    fn sync_auto_disables_when_a_socket_drops() {
        let mut engine = SyncEngine::new(&cfg(0, 0));
        engine.sync_on = true;
        engine.update_sync_state();
        assert!(!engine.sync_on);
    }

    fn wait_for_both_connected(engine: &mut SyncEngine, renderer: &mut dyn Renderer) {
        wait_for_closure(engine, renderer, |e| e.rig.sock.is_some() && e.sdr.sock.is_some());
    }

    fn wait_for_closure(engine: &mut SyncEngine, renderer: &mut dyn Renderer, mut pred: impl FnMut(&SyncEngine) -> bool) {
        for _ in 0..200 {
            engine.reconnect_sockets(Instant::now());
            engine.tick(Instant::now(), renderer);
            if pred(engine) {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("peers never connected");
    }
}
