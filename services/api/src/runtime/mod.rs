//! services/api/src/runtime/mod.rs
//!
//! Long-lived, stateful pieces of the service: the session runtime that owns
//! the countdown and posture polling, and the per-connection activity monitor.

pub mod monitor;
mod posture_poller;
pub mod session;

pub use monitor::{MonitorHandle, MonitorInput, MonitorSnapshot};
pub use session::{PostureSnapshot, RuntimeSettings, SessionRuntime, TimerSnapshot};

use study_buddy_core::{ports::PortError, timer::TimerError};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Port(#[from] PortError),
}
