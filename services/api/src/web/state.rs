//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::runtime::SessionRuntime;
use std::sync::Arc;
use std::time::Duration;
use study_buddy_core::{
    activity::ActivitySettings,
    ports::{DatabaseService, StudyMaterialService},
};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub study: Arc<dyn StudyMaterialService>,
    /// The single session runtime; there is one timer per server.
    pub runtime: SessionRuntime,
    /// Settings for each monitor socket's activity detection.
    pub activity: ActivitySettings,
    /// How often a monitor re-evaluates its reminder watchdogs.
    pub monitor_check_period: Duration,
}
