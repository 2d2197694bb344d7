//! On-die temperature sensor of the ESP32-S3.
//!
//! Absolute accuracy is poor (±5–10 °C), so every reading gets a fixed
//! calibration offset.  Successive readings are smoothed with a one-pole IIR.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Default IIR weight of the newest sample.
pub const SMOOTHING_ALPHA: f32 = 0.2;

/// f32 bits of the simulated raw reading (25.0 °C).
#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(0x41C8_0000);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_raw_celsius(celsius: f32) {
    SIM_TEMP_BITS.store(celsius.to_bits(), Ordering::Relaxed);
}

/// One-pole IIR: `(1 - alpha) * prev + alpha * now`.
pub fn smooth(prev: f32, now: f32, alpha: f32) -> f32 {
    (1.0 - alpha) * prev + alpha * now
}

pub struct ChipTemperature {
    offset_c: f32,
    smoothed: Option<f32>,
}

impl ChipTemperature {
    pub fn new(offset_c: f32) -> Self {
        Self {
            offset_c,
            smoothed: None,
        }
    }

    /// Offset-corrected reading, folded into the smoothed value.
    pub fn read(&mut self) -> f32 {
        let now = read_raw() + self.offset_c;
        let value = match self.smoothed {
            Some(prev) => smooth(prev, now, SMOOTHING_ALPHA),
            None => now,
        };
        self.smoothed = Some(value);
        value
    }
}

#[cfg(target_os = "espidf")]
fn read_raw() -> f32 {
    hw_init::chip_temp_read_celsius()
}

#[cfg(not(target_os = "espidf"))]
fn read_raw() -> f32 {
    f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed))
}
