//! GPIO / peripheral pin assignments for the Heltec WiFi LoRa 32 V3.
//!
//! Numeric pins the Rust side drives.  Pins handed over as typed
//! `esp-idf-hal` peripherals or owned by the radio shim are noted, not
//! declared.

// ---------------------------------------------------------------------------
// Power rails
// ---------------------------------------------------------------------------

/// External 3V3 rail (OLED, LoRa front end).  LOW = on, HIGH = off.
pub const VEXT_GPIO: i32 = 36;

/// Battery divider enable.  HIGH = VBAT routed onto the divider.
pub const BATT_EN_GPIO: i32 = 37;

// ---------------------------------------------------------------------------
// Battery sense (ADC1)
// ---------------------------------------------------------------------------

/// Divider tap on GPIO 1, which is ADC1 channel 0 on the ESP32-S3.
pub const BATT_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// SSD1306 OLED (I2C)
// ---------------------------------------------------------------------------

// SDA is GPIO 17 and SCL is GPIO 18.  `main` hands them to `I2cDriver` as
// typed pins (`gpio17`, `gpio18`), so they have no numeric constant here.

/// Active-low reset.
pub const OLED_RST_GPIO: i32 = 21;
pub const OLED_I2C_ADDR: u8 = 0x3C;
pub const OLED_I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// SX1262 LoRa transceiver
// ---------------------------------------------------------------------------

// Owned by the radiolib_shim component (NSS 8, SCK 9, MOSI 10, MISO 11,
// RST 12, BUSY 13, DIO1 14).  No Rust code touches these pins.
