//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements    | Connects to                        |
//! |--------------|---------------|------------------------------------|
//! | `adc`        | SensorPort    | ESP32 ADC1 oneshot / injected sims |
//! | `delay`      | DelayNs       | `std::thread::sleep`               |
//! | `fs_store`   | FileStore     | SD card FAT mount / host directory |
//! | `log_sink`   | EventSink     | Serial log output                  |
//! | `mem_store`  | FileStore     | RAM (simulator, tests)             |
//! | `soft_rtc`   | RtcPeripheral | Monotonic timer + calendar base    |
//! | `udp_radio`  | RadioPort     | UDP socket (lwIP / host loopback)  |

pub mod adc;
pub mod delay;
pub mod fs_store;
pub mod log_sink;
pub mod mem_store;
pub mod soft_rtc;
pub mod udp_radio;
