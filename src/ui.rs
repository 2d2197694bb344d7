//! Screen contents for the 128x64 OLED.
//!
//! The display is presentation only; nothing here affects the cycle.
//! Text is built into fixed-capacity strings so the drawing code never
//! allocates.

use core::fmt::Write;

use crate::sensors::SensorReading;

/// One rendered text line.
pub type Line = heapless::String<32>;

/// What the display should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    /// Shown right after wake.
    Banner { cycle: u32 },
    /// Shown just before deep sleep.
    Status {
        sent: bool,
        reading: Option<SensorReading>,
        cycle: u32,
        sleep_secs: u32,
    },
}

/// `WAKE 12`
pub fn banner(cycle: u32) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "WAKE {}", cycle);
    line
}

pub fn status_glyph(sent: bool) -> &'static str {
    if sent { "Sent OK" } else { "Send fail" }
}

/// `Batt 3.98 V 85%  28.6°C`; the temperature reads `--` when unavailable.
pub fn battery_line(reading: &SensorReading) -> Line {
    let mut line = Line::new();
    let _ = write!(
        line,
        "Batt {:.2} V {}%  ",
        f32::from(reading.battery_mv) / 1000.0,
        reading.battery_percent
    );
    let _ = if reading.chip_temp_c.is_nan() {
        write!(line, "--\u{00b0}C")
    } else {
        write!(line, "{:.1}\u{00b0}C", reading.chip_temp_c)
    };
    line
}

/// `Cycle 12  T-300s`
pub fn cycle_line(cycle: u32, sleep_secs: u32) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "Cycle {}  T-{}s", cycle, sleep_secs);
    line
}
