//! Blocking delay for inter-frame pacing.
//!
//! Implements [`embedded_hal::delay::DelayNs`] with `std::thread::sleep`,
//! which on ESP-IDF maps onto a FreeRTOS tick delay.

use std::time::Duration;

use embedded_hal::delay::DelayNs;

#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}
