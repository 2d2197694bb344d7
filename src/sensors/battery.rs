//! LiPo battery voltage through the on-board 390k/100k divider.
//!
//! GPIO37 routes VBAT onto the divider; the tap is read on ADC1_CH0
//! (GPIO1) with 12 dB attenuation and converted to millivolts by the ADC
//! calibration scheme.  Each measurement waits for the divider to settle,
//! averages `samples` reads, scales by the divider ratio and clamps.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads calibrated millivolts via hw_init.
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::config::BatteryConfig;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Pin-side millivolts returned by every simulated ADC read.
#[cfg(not(target_os = "espidf"))]
static SIM_PIN_MV: AtomicU16 = AtomicU16::new(800);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_pin_mv(mv: u16) {
    SIM_PIN_MV.store(mv, Ordering::Relaxed);
}

/// Divider settle time after enabling the sense path.
const SETTLE_US: u32 = 200;
/// Gap between consecutive ADC samples.
const SAMPLE_GAP_US: u32 = 150;

/// Mean of pin-side millivolt samples.  Empty input reads as 0.
pub fn average_mv(samples: &[u16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
    sum as f32 / samples.len() as f32
}

/// Scale an averaged pin voltage to battery millivolts, round and clamp.
pub fn battery_mv(pin_mv: f32, cfg: &BatteryConfig) -> u16 {
    // Rounded, not truncated: can read 1 mV above firmware that casts the
    // scaled value straight to an integer.
    let mv = (pin_mv * cfg.divider).round();
    mv.clamp(f32::from(cfg.min_mv), f32::from(cfg.max_mv)) as u16
}

/// Approximate state of charge from the open-circuit voltage.
///
/// Piecewise linear: 4.20–3.90 V maps to 100–80 %, 3.90–3.70 V to
/// 80–40 %, 3.70–3.30 V to 40–0 %.
pub fn percent(mv: u16) -> u8 {
    if mv >= 4200 {
        return 100;
    }
    if mv <= 3300 {
        return 0;
    }
    let mv = u32::from(mv);
    let pct = if mv > 3900 {
        80 + (mv - 3900) * 20 / 300
    } else if mv > 3700 {
        40 + (mv - 3700) * 40 / 200
    } else {
        (mv - 3300) * 40 / 400
    };
    pct as u8
}

pub struct BatteryMonitor {
    cfg: BatteryConfig,
}

impl BatteryMonitor {
    pub fn new(cfg: BatteryConfig) -> Self {
        Self { cfg }
    }

    /// Take one averaged measurement.  The sense path must already be
    /// enabled.
    pub fn read_millivolts(&mut self) -> u16 {
        delay_us(SETTLE_US);
        let mut samples = heapless::Vec::<u16, 64>::new();
        for _ in 0..self.cfg.samples {
            if samples.push(read_pin_mv()).is_err() {
                break;
            }
            delay_us(SAMPLE_GAP_US);
        }
        battery_mv(average_mv(&samples), &self.cfg)
    }
}

#[cfg(target_os = "espidf")]
fn read_pin_mv() -> u16 {
    hw_init::battery_adc_read_mv()
}

#[cfg(not(target_os = "espidf"))]
fn read_pin_mv() -> u16 {
    SIM_PIN_MV.load(Ordering::Relaxed)
}

#[cfg(target_os = "espidf")]
fn delay_us(us: u32) {
    esp_idf_hal::delay::Ets::delay_us(us);
}

#[cfg(not(target_os = "espidf"))]
fn delay_us(_us: u32) {}
