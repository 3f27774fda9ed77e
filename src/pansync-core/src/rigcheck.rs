// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Independent Rig liveness probe.
//!
//! This keeps its own socket to the Rig endpoint, entirely separate from the
//! engine's own peer socket to the same address. That double-connection is
//! intentional (see `SPEC_FULL.md` §9 / `spec.md` §9): the probe must be
//! able to declare the Rig "present" without perturbing the engine's
//! command/reply pipeline, at the cost that a Rig the probe considers
//! connected may still be unreachable from the engine's own socket. The two
//! paths are kept independent on purpose; callers should surface both.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::ProbeError;

/// Runs on a scheduler worker thread, so ordinary blocking I/O with a short
/// timeout is appropriate here — unlike the engine's own peer sockets, this
/// is never touched by the main loop.
pub struct RigProbe {
    host: String,
    port: u16,
    sock: Option<TcpStream>,
}

impl RigProbe {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            sock: None,
        }
    }

    /// Request the Rig's frequency and interpret an integer reply as
    /// "present". Any socket trouble drops the probe's own connection so the
    /// next call reconnects from scratch.
    pub fn check(&mut self) -> Result<(), ProbeError> {
        self.ensure_socket()?;
        let sock = self.sock.as_mut().expect("ensured above");

        if let Err(e) = sock.write_all(b"f\n") {
            self.sock = None;
            return Err(ProbeError::Io(e));
        }

        let mut buf = [0u8; 1024];
        let n = match sock.read(&mut buf) {
            Ok(0) => {
                self.sock = None;
                return Err(ProbeError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "rig probe socket closed",
                )));
            }
            Ok(n) => n,
            Err(e) => {
                self.sock = None;
                return Err(ProbeError::Io(e));
            }
        };

        let reply = String::from_utf8_lossy(&buf[..n]);
        let first_line = reply.split('\n').next().unwrap_or("").trim();
        match first_line.parse::<i64>() {
            Ok(_) => Ok(()),
            Err(_) => Err(ProbeError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "rig probe got a non-integer reply",
            ))),
        }
    }

    fn ensure_socket(&mut self) -> Result<(), ProbeError> {
        if self.sock.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(ProbeError::Connect)?;
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .map_err(ProbeError::Io)?;
        self.sock = Some(stream);
        Ok(())
    }
}

/// Independent SDR connectivity probe, registered with the scheduler
/// alongside [`RigProbe`]. Unlike the Rig probe it never speaks CAT — a bare
/// TCP connect-and-drop is enough to declare the SDR endpoint reachable,
/// since the engine's own peer socket is what actually exchanges `LNB_LO`/`f`
/// with it. Kept as its own short-lived connection per check, not a held
/// socket, since there's no ongoing session to reuse.
pub struct SdrProbe {
    host: String,
    port: u16,
}

impl SdrProbe {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    pub fn check(&mut self) -> Result<(), ProbeError> {
        TcpStream::connect((self.host.as_str(), self.port))
            .map(|_| ())
            .map_err(ProbeError::Connect)
    }
}
