// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod band;
pub mod cat;
pub mod config;
pub mod engine;
pub mod error;
pub mod freqlog;
pub mod registry;
pub mod renderer;
pub mod rigcheck;
pub mod scheduler;
pub mod step;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use band::{Band, BandTable};
pub use config::{DeviceRegisterConfig, RigCheckConfig, SchedulerConfig, SyncConfig};
pub use engine::{PeerState, Role, SyncEngine};
pub use error::EngineError;
pub use registry::{Capability, DeviceRegistry};
pub use renderer::Renderer;
pub use scheduler::ReconnectScheduler;
pub use step::StepCycler;
