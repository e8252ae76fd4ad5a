//! Fieldlog firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! host simulator.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod rpc;
pub mod scheduler;
pub mod storage;
