//! Sensor subsystem — battery monitor and on-die temperature.
//!
//! Both are sampled once per wake, after a session is ready, and combined
//! into a [`SensorReading`] for the uplink and the status screen.

pub mod battery;
pub mod chip_temp;

/// Everything measured during one wake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub battery_mv: u16,
    pub battery_percent: u8,
    pub chip_temp_c: f32,
}

impl SensorReading {
    pub fn new(battery_mv: u16, chip_temp_c: f32) -> Self {
        Self {
            battery_mv,
            battery_percent: battery::percent(battery_mv),
            chip_temp_c,
        }
    }
}
