//! Heltec WiFi LoRa 32 V3 board adapter.
//!
//! Owns the battery monitor, the on-die temperature sensor and the OLED,
//! exposing them through [`BoardPort`] and [`DisplayPort`].  Rail
//! sequencing (VEXT, OLED reset, battery divider) lives here and nowhere
//! else.  On non-espidf targets GPIO writes hit the hw_init simulation,
//! delays are skipped and deep sleep unwinds instead of resetting.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::ports::{BoardPort, DisplayPort};
use crate::config::NodeConfig;
use crate::drivers::hw_init::{self, WakeCause};
use crate::drivers::oled::OledDisplay;
use crate::pins;
use crate::sensors::battery::BatteryMonitor;
use crate::sensors::chip_temp::ChipTemperature;
use crate::ui::{self, Screen};

/// VEXT needs this long before the OLED answers on I2C.
const VEXT_SETTLE_MS: u32 = 10;
/// Reset pulse release time for the SSD1306.
const OLED_RESET_MS: u32 = 5;

pub struct HeltecBoard<I2C> {
    /// Bus handed to the OLED once VEXT is up.
    i2c: Option<I2C>,
    display: Option<OledDisplay<I2C>>,
    battery: BatteryMonitor,
    temperature: ChipTemperature,
    #[cfg(not(target_os = "espidf"))]
    elapsed_ms: u64,
}

impl<I2C: I2c> HeltecBoard<I2C> {
    /// `i2c` is the bus wired to the OLED (SDA 17 / SCL 18).  Pass `None`
    /// to run headless.
    pub fn new(i2c: Option<I2C>, config: &NodeConfig) -> Self {
        Self {
            i2c,
            display: None,
            battery: BatteryMonitor::new(config.battery),
            temperature: ChipTemperature::new(config.temp_offset_c),
            #[cfg(not(target_os = "espidf"))]
            elapsed_ms: 0,
        }
    }

    pub fn wake_cause(&self) -> WakeCause {
        hw_init::wake_cause()
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Total time spent in [`BoardPort::delay_ms`] (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    fn rails_off(&mut self) {
        hw_init::gpio_write(pins::OLED_RST_GPIO, false);
        hw_init::gpio_write(pins::VEXT_GPIO, true);
        hw_init::gpio_write(pins::BATT_EN_GPIO, false);
    }
}

impl<I2C: I2c> BoardPort for HeltecBoard<I2C> {
    fn power_up(&mut self) {
        // VEXT is active-low.
        hw_init::gpio_write(pins::VEXT_GPIO, false);
        self.delay_ms(VEXT_SETTLE_MS);
        hw_init::gpio_write(pins::OLED_RST_GPIO, true);
        self.delay_ms(OLED_RESET_MS);

        if let Some(i2c) = self.i2c.take() {
            match OledDisplay::new(i2c) {
                Ok(display) => self.display = Some(display),
                Err(e) => warn!("Board: {}, continuing headless", e),
            }
        }

        hw_init::gpio_write(pins::BATT_EN_GPIO, true);
        info!("Board: rails up (display={})", self.display.is_some());
    }

    fn battery_millivolts(&mut self) -> u16 {
        self.battery.read_millivolts()
    }

    fn chip_temperature_c(&mut self) -> f32 {
        self.temperature.read()
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += u64::from(ms);
    }

    #[cfg(target_os = "espidf")]
    fn deep_sleep(&mut self, secs: u32) -> ! {
        self.rails_off();
        info!("Board: deep sleep for {} s", secs);
        log::logger().flush();
        hw_init::enter_deep_sleep(secs)
    }

    #[cfg(not(target_os = "espidf"))]
    fn deep_sleep(&mut self, secs: u32) -> ! {
        self.rails_off();
        info!("Board(sim): deep sleep for {} s", secs);
        // A host process cannot sleep-and-reset; unwind to the caller.
        panic!("deep sleep for {} s", secs);
    }
}

impl<I2C: I2c> DisplayPort for HeltecBoard<I2C> {
    fn show(&mut self, screen: &Screen) {
        match screen {
            Screen::Banner { cycle } => info!("Display: {}", ui::banner(*cycle)),
            Screen::Status {
                sent,
                reading,
                cycle,
                sleep_secs,
            } => {
                info!("Display: {}", ui::status_glyph(*sent));
                if let Some(r) = reading {
                    info!("Display: {}", ui::battery_line(r));
                }
                info!("Display: {}", ui::cycle_line(*cycle, *sleep_secs));
            }
        }
        if let Some(display) = self.display.as_mut() {
            if let Err(e) = display.show(screen) {
                warn!("Board: {}", e);
            }
        }
    }
}
