//! Application core: the logger's domain wiring, zero direct I/O.
//!
//! Ports in [`ports`], structured events in [`events`], the shared
//! session in [`context`], and the cooperative main-loop node in
//! [`service`].  All interaction with peripherals happens through the
//! port traits, keeping this layer testable without hardware.

pub mod context;
pub mod events;
pub mod ports;
pub mod service;
