//! Analog sensor bank.
//!
//! Implements [`SensorPort`] for up to [`MAX_CHANNELS`] analog inputs.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: ADC1 oneshot reads, 12-bit, 12 dB attenuation, channels
//! `ADC1_CH0..CH3`.
//! On host/test: reads from static `AtomicU16`s set with
//! [`sim_set_channel`].

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::SensorPort;
use crate::config::MAX_CHANNELS;

#[cfg(not(target_os = "espidf"))]
static SIM_CHANNELS: [AtomicU16; MAX_CHANNELS] = [
    AtomicU16::new(0),
    AtomicU16::new(0),
    AtomicU16::new(0),
    AtomicU16::new(0),
];

/// Inject a raw reading for `channel` (host only).  Out-of-range
/// channels are ignored.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_channel(channel: u8, raw: u16) {
    if let Some(slot) = SIM_CHANNELS.get(channel as usize) {
        slot.store(raw, Ordering::Relaxed);
    }
}

pub struct AdcBank {
    #[cfg(target_os = "espidf")]
    unit: esp_idf_svc::sys::adc_oneshot_unit_handle_t,
}

#[cfg(target_os = "espidf")]
impl AdcBank {
    /// Claim ADC1 and configure every channel.
    pub fn new() -> Result<Self, crate::error::Error> {
        use esp_idf_svc::sys::*;

        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: `unit` is a valid out-pointer; the handle is owned by
        // this struct from here on.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
        if ret != ESP_OK as i32 {
            return Err(crate::error::Error::Init("ADC1 unit"));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        for ch in 0..MAX_CHANNELS as u32 {
            // SAFETY: `unit` was initialised above.
            let ret = unsafe { adc_oneshot_config_channel(unit, ch, &chan_cfg) };
            if ret != ESP_OK as i32 {
                return Err(crate::error::Error::Init("ADC1 channel"));
            }
        }
        log::info!("Sensors: ADC1 CH0..CH{} configured", MAX_CHANNELS - 1);
        Ok(Self { unit })
    }
}

#[cfg(target_os = "espidf")]
impl SensorPort for AdcBank {
    fn read_channel(&mut self, channel: u8) -> u16 {
        if channel as usize >= MAX_CHANNELS {
            return 0;
        }
        let mut raw: i32 = 0;
        // SAFETY: handle initialised in `new`; main-loop access only.
        let ret = unsafe {
            esp_idf_svc::sys::adc_oneshot_read(self.unit, channel as u32, &mut raw)
        };
        if ret != esp_idf_svc::sys::ESP_OK as i32 {
            return 0;
        }
        raw.max(0) as u16
    }
}

#[cfg(not(target_os = "espidf"))]
impl AdcBank {
    pub fn new() -> Result<Self, crate::error::Error> {
        Ok(Self {})
    }
}

#[cfg(not(target_os = "espidf"))]
impl SensorPort for AdcBank {
    fn read_channel(&mut self, channel: u8) -> u16 {
        SIM_CHANNELS
            .get(channel as usize)
            .map(|slot| slot.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}
