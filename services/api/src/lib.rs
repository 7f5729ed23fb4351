//! services/api/src/lib.rs
//!
//! The StudyBuddy API service: adapters for the core ports, the session
//! runtime and the web layer. The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod runtime;
pub mod web;
