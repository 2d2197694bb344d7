//! One-shot hardware peripheral initialization.
//!
//! Configures the rail/reset GPIOs, the battery ADC channel with its
//! calibration scheme and the on-die temperature sensor using raw ESP-IDF
//! sys calls.  Called once from `main()` right after boot.  Also owns the
//! deep-sleep entry and wake-cause query.
//!
//! On host targets every call is simulated: GPIO levels are kept in an
//! atomic bitmask so tests can check rail sequencing.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    AdcCalibrationFailed(i32),
    GpioConfigFailed(i32),
    TempSensorFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::AdcCalibrationFailed(rc) => write!(f, "ADC1 calibration failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::TempSensorFailed(rc) => write!(f, "temperature sensor init failed (rc={})", rc),
        }
    }
}

/// Why the chip came out of reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-on, reset button or flash.
    PowerOn,
    /// Deep-sleep timer expired.
    Timer,
    /// Any other wake source, raw `esp_sleep_source_t`.
    Other(u32),
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before anything else touches these
    // peripherals; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_adc()?;
        init_temp_sensor()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // Safe levels: VEXT off (HIGH), OLED held in reset, divider off.
    let outputs = [
        (pins::VEXT_GPIO, true),
        (pins::OLED_RST_GPIO, false),
        (pins::BATT_EN_GPIO, false),
    ];

    for &(pin, level) in &outputs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, u32::from(level)) };
    }

    info!("hw_init: GPIO outputs configured (VEXT, OLED_RST, BATT_EN)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio_outputs(). Main task only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
static SIM_GPIO_LEVELS: core::sync::atomic::AtomicU64 = core::sync::atomic::AtomicU64::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    use core::sync::atomic::Ordering;
    let bit = 1u64 << pin;
    if high {
        SIM_GPIO_LEVELS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SIM_GPIO_LEVELS.fetch_and(!bit, Ordering::Relaxed);
    }
}

/// Last level written to `pin` (simulation only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> bool {
    SIM_GPIO_LEVELS.load(core::sync::atomic::Ordering::Relaxed) & (1u64 << pin) != 0
}

// ── ADC (oneshot + calibration) ──────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut ADC1_CALI: adc_cali_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(ADC1_HANDLE, pins::BATT_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let cali_cfg = adc_cali_curve_fitting_config_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        chan: pins::BATT_ADC_CHANNEL,
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: ADC1_CALI is only written here, once at boot.
    let ret = unsafe { adc_cali_create_scheme_curve_fitting(&cali_cfg, &raw mut ADC1_CALI) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcCalibrationFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured (battery, 12 dB, calibrated)", pins::BATT_ADC_CHANNEL);
    Ok(())
}

/// Calibrated millivolts at the battery divider tap.  0 on read error.
#[cfg(target_os = "espidf")]
pub fn battery_adc_read_mv() -> u16 {
    let mut mv: i32 = 0;
    // SAFETY: both handles are written once during init_adc() before this
    // is called; main-task access only.
    let ret = unsafe {
        adc_oneshot_get_calibrated_result(ADC1_HANDLE, ADC1_CALI, pins::BATT_ADC_CHANNEL, &mut mv)
    };
    if ret != ESP_OK as i32 {
        return 0;
    }
    mv.max(0) as u16
}

// ── On-die temperature sensor ────────────────────────────────

#[cfg(target_os = "espidf")]
static mut TEMP_HANDLE: temperature_sensor_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_temp_sensor() -> Result<(), HwInitError> {
    let cfg = temperature_sensor_config_t {
        range_min: -10,
        range_max: 80,
        ..Default::default()
    };
    // SAFETY: TEMP_HANDLE is only written here, once at boot.
    let ret = unsafe { temperature_sensor_install(&cfg, &raw mut TEMP_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::TempSensorFailed(ret));
    }
    let ret = unsafe { temperature_sensor_enable(TEMP_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::TempSensorFailed(ret));
    }
    info!("hw_init: temperature sensor enabled (-10..80 °C)");
    Ok(())
}

/// Raw on-die temperature.  NaN on read error.
#[cfg(target_os = "espidf")]
pub fn chip_temp_read_celsius() -> f32 {
    let mut celsius: f32 = 0.0;
    // SAFETY: TEMP_HANDLE written once in init_temp_sensor(); main task only.
    let ret = unsafe { temperature_sensor_get_celsius(TEMP_HANDLE, &mut celsius) };
    if ret != ESP_OK as i32 {
        return f32::NAN;
    }
    celsius
}

// ── Sleep ─────────────────────────────────────────────────────

/// Arm the wake timer and enter deep sleep.  The chip resets on wake.
#[cfg(target_os = "espidf")]
pub fn enter_deep_sleep(secs: u32) -> ! {
    // SAFETY: plain register configuration; nothing runs after this.
    unsafe {
        esp_sleep_enable_timer_wakeup(u64::from(secs) * 1_000_000);
        esp_deep_sleep_start();
    }
}

#[cfg(target_os = "espidf")]
pub fn wake_cause() -> WakeCause {
    // SAFETY: read-only query of the RTC wake status.
    let cause = unsafe { esp_sleep_get_wakeup_cause() };
    if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
        WakeCause::Timer
    } else if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED {
        WakeCause::PowerOn
    } else {
        WakeCause::Other(cause)
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn wake_cause() -> WakeCause {
    WakeCause::PowerOn
}
