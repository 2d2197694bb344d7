//! lwnode firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HeltecBoard        LoRaWanRadio    NvsAdapter   RtcRetained │
//! │  (Board+Display)    (RadioPort)     (BlobStore)  (Retained)  │
//! │  LogEventSink                                                │
//! │  (EventSink)                                                 │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────          │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │        WakeCycle (pure logic)                        │    │
//! │  │  restore-or-join · uplink · persist                  │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no event loop: every boot is one wake.  `main` wires the
//! adapters, runs the cycle once and hands the chip to deep sleep.

use anyhow::{Result, anyhow};
use log::{error, info, warn};

use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;

use lwnode::adapters::board::HeltecBoard;
use lwnode::adapters::device_id;
use lwnode::adapters::log_sink::LogEventSink;
use lwnode::adapters::nvs::NvsAdapter;
use lwnode::adapters::radio::LoRaWanRadio;
use lwnode::adapters::rtc::RtcRetained;
use lwnode::app::cycle::WakeCycle;
use lwnode::app::ports::RetainedMemory;
use lwnode::config::{self, ConfigOverrides, DeviceIdentity};
use lwnode::drivers::hw_init;
use lwnode::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  lwnode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Sensors read as clamped minimum / NaN; the uplink still goes out.
        error!("HAL init failed: {}, continuing with degraded sensors", e);
    }

    // ── 3. Persistent store + config ──────────────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;

    #[cfg(feature = "factory-reset")]
    if let Err(e) = lwnode::session::factory_reset(&mut nvs) {
        warn!("Factory reset failed: {}", e);
    }

    let overrides = ConfigOverrides::from_build_env().unwrap_or_else(|e| {
        warn!("Ignoring build config overrides: {}", e);
        ConfigOverrides::default()
    });
    let config = config::provision(&mut nvs, &overrides);

    // ── 4. Identity ───────────────────────────────────────────
    let mac_eui = device_id::eui64_from_mac(&device_id::read_mac());
    let identity = DeviceIdentity::from_build_env()
        .map_err(|e| anyhow!("{}", e))?
        .with_fallback_dev_eui(mac_eui);
    info!(
        "DevEUI {} JoinEUI {}",
        device_id::eui_string(identity.dev_eui),
        device_id::eui_string(identity.join_eui)
    );

    // ── 5. Adapters ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::OLED_I2C_FREQ_HZ));
    let i2c = match I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio17, // OLED SDA
        peripherals.pins.gpio18, // OLED SCL
        &i2c_config,
    ) {
        Ok(i2c) => Some(i2c),
        Err(e) => {
            warn!("I2C init failed ({}), running headless", e);
            None
        }
    };

    let mut board = HeltecBoard::new(i2c, &config);
    let mut radio = LoRaWanRadio::new();
    let mut retained = RtcRetained::new();
    let mut sink = LogEventSink::new();

    info!("Boot: wake cause {:?}", board.wake_cause());

    // ── 6. One wake ───────────────────────────────────────────
    let mut cycle = WakeCycle::new(config, identity, retained.load_wake_count());
    let report = cycle.run(&mut radio, &mut nvs, &mut board, &mut sink);
    if let Err(e) = report.result {
        warn!("Cycle {} failed: {}", report.cycle, e);
    }

    // ── 7. Deep sleep (does not return) ───────────────────────
    cycle.finish(&mut board, &mut retained)
}
