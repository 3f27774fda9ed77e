// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use thiserror::Error;

use crate::engine::Role;

/// Value carried by the engine's internal log lines for the error kinds
/// that are recovered locally rather than propagated: `tick()` never
/// returns a `Result`, so this is only ever formatted into a `tracing`
/// event, never matched on by a caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("peer {0:?} socket error: {1}")]
    SocketError(Role, std::io::Error),

    #[error("peer {0:?} protocol error: {1}")]
    ProtocolError(Role, String),

    #[error("frequency log unavailable: {0}")]
    LogUnavailable(std::io::Error),

    #[error("cannot disable both rig and sdr")]
    BothRadiosDisabled,
}

/// Failure returned by a registered reconnection probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(std::io::Error),

    #[error("probe I/O error: {0}")]
    Io(std::io::Error),

    #[error("probe panicked")]
    Panicked,
}

/// Failure returned by a device registry mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("cannot disable both rig and sdr")]
    BothRadiosDisabled,
}
