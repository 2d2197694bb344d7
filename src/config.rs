//! Node configuration parameters
//!
//! All tunable parameters for the sensor node.  Values persist in NVS
//! (namespace `node`, key `cfg`) and fall back to the defaults below.
//! A build can carry overrides (`LW_REGION`, `LW_SUB_BAND`,
//! `LW_SLEEP_SECS`, `LW_TEMP_OFFSET_C`); [`provision`] validates them and
//! writes them to NVS on the first boot of that build, so they stay in
//! effect after a reflash without them.
//! The LoRaWAN identity is compiled in from the build environment.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigPort;

/// LoRaWAN regional channel plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Eu868,
    Us915,
    Au915,
    As923,
    In865,
}

/// Battery divider and ADC sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// VBAT / ADC-pin ratio of the resistor divider (390k/100k, trimmed to a DMM).
    pub divider: f32,
    /// ADC reads averaged per measurement.
    pub samples: u8,
    /// Readings are clamped into `min_mv..=max_mv`.
    pub min_mv: u16,
    pub max_mv: u16,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            divider: 4.95,
            samples: 8,
            min_mv: 2000,
            max_mv: 5000,
        }
    }
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Radio ---
    pub region: Region,
    /// US915/AU915 sub-band (0 = stack default).
    pub sub_band: u8,

    // --- Timing ---
    /// Deep-sleep duration between wakes (seconds)
    pub sleep_secs: u32,
    /// How long the wake banner stays up (milliseconds)
    pub banner_hold_ms: u32,
    /// How long the final status stays up before sleeping (milliseconds)
    pub status_hold_ms: u32,

    // --- Sensors ---
    pub battery: BatteryConfig,
    /// Added to the raw on-die temperature reading (Celsius).
    pub temp_offset_c: f32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            region: Region::Eu868,
            sub_band: 0,

            sleep_secs: 300,
            banner_hold_ms: 2000,
            status_hold_ms: 2000,

            battery: BatteryConfig::default(),
            temp_offset_c: 0.0,
        }
    }
}

/// Range checks applied before a config is persisted.
pub fn validate(cfg: &NodeConfig) -> Result<(), &'static str> {
    if !(10..=86_400).contains(&cfg.sleep_secs) {
        return Err("sleep_secs must be 10–86400");
    }
    if cfg.banner_hold_ms > 10_000 || cfg.status_hold_ms > 10_000 {
        return Err("display hold times must be <= 10000 ms");
    }
    if cfg.sub_band > 8 {
        return Err("sub_band must be 0–8");
    }
    if !(1.0..=20.0).contains(&cfg.battery.divider) {
        return Err("battery.divider must be 1.0–20.0");
    }
    if !(1..=64).contains(&cfg.battery.samples) {
        return Err("battery.samples must be 1–64");
    }
    if cfg.battery.min_mv >= cfg.battery.max_mv {
        return Err("battery.min_mv must be < battery.max_mv");
    }
    if !(-20.0..=20.0).contains(&cfg.temp_offset_c) {
        return Err("temp_offset_c must be -20.0–20.0");
    }
    Ok(())
}

impl Region {
    /// Parse a plan name such as `EU868` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let plans = [
            ("EU868", Self::Eu868),
            ("US915", Self::Us915),
            ("AU915", Self::Au915),
            ("AS923", Self::As923),
            ("IN865", Self::In865),
        ];
        plans
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
            .map(|&(_, r)| r)
    }
}

// ---------------------------------------------------------------------------
// Build-time overrides
// ---------------------------------------------------------------------------

/// Config fields fixed by the build environment.  `None` keeps the stored
/// value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConfigOverrides {
    pub region: Option<Region>,
    pub sub_band: Option<u8>,
    pub sleep_secs: Option<u32>,
    pub temp_offset_c: Option<f32>,
}

/// Unparseable value in a build-time config variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideParseError(pub &'static str);

impl core::fmt::Display for OverrideParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid value in {}", self.0)
    }
}

impl ConfigOverrides {
    pub fn from_build_env() -> Result<Self, OverrideParseError> {
        Self::parse(
            option_env!("LW_REGION"),
            option_env!("LW_SUB_BAND"),
            option_env!("LW_SLEEP_SECS"),
            option_env!("LW_TEMP_OFFSET_C"),
        )
    }

    /// Unset or blank variables leave the field alone.
    pub fn parse(
        region: Option<&str>,
        sub_band: Option<&str>,
        sleep_secs: Option<&str>,
        temp_offset_c: Option<&str>,
    ) -> Result<Self, OverrideParseError> {
        fn field<T: core::str::FromStr>(
            value: Option<&str>,
            var: &'static str,
        ) -> Result<Option<T>, OverrideParseError> {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(v) => v.parse().map(Some).map_err(|_| OverrideParseError(var)),
                None => Ok(None),
            }
        }

        let region = match region.map(str::trim).filter(|v| !v.is_empty()) {
            Some(name) => Some(Region::from_name(name).ok_or(OverrideParseError("LW_REGION"))?),
            None => None,
        };
        Ok(Self {
            region,
            sub_band: field(sub_band, "LW_SUB_BAND")?,
            sleep_secs: field(sleep_secs, "LW_SLEEP_SECS")?,
            temp_offset_c: field(temp_offset_c, "LW_TEMP_OFFSET_C")?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, base: &NodeConfig) -> NodeConfig {
        NodeConfig {
            region: self.region.unwrap_or(base.region),
            sub_band: self.sub_band.unwrap_or(base.sub_band),
            sleep_secs: self.sleep_secs.unwrap_or(base.sleep_secs),
            temp_offset_c: self.temp_offset_c.unwrap_or(base.temp_offset_c),
            ..base.clone()
        }
    }
}

/// Load the stored config and fold the build overrides into it.
///
/// A changed config is saved (and therefore validated) before use.  If the
/// save is refused the stored config stays in effect.
pub fn provision(store: &mut impl ConfigPort, overrides: &ConfigOverrides) -> NodeConfig {
    let stored = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config: load failed ({}), using defaults", e);
            NodeConfig::default()
        }
    };
    if overrides.is_empty() {
        return stored;
    }

    let wanted = overrides.apply(&stored);
    if wanted == stored {
        return stored;
    }
    match store.save(&wanted) {
        Ok(()) => {
            info!("Config: build overrides saved");
            wanted
        }
        Err(e) => {
            warn!("Config: build overrides refused ({}), keeping stored config", e);
            stored
        }
    }
}

// ---------------------------------------------------------------------------
// Device identity
// ---------------------------------------------------------------------------

/// OTAA identity: join EUI, device EUI and the two LoRaWAN 1.1 root keys.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub join_eui: u64,
    pub dev_eui: u64,
    pub nwk_key: [u8; 16],
    pub app_key: [u8; 16],
}

impl core::fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Keys stay out of logs.
        f.debug_struct("DeviceIdentity")
            .field("join_eui", &format_args!("{:016X}", self.join_eui))
            .field("dev_eui", &format_args!("{:016X}", self.dev_eui))
            .finish_non_exhaustive()
    }
}

/// Malformed hex in a build-time identity variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityParseError(pub &'static str);

impl core::fmt::Display for IdentityParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid hex in {}", self.0)
    }
}

impl DeviceIdentity {
    pub const fn new(join_eui: u64, dev_eui: u64, nwk_key: [u8; 16], app_key: [u8; 16]) -> Self {
        Self {
            join_eui,
            dev_eui,
            nwk_key,
            app_key,
        }
    }

    /// Identity baked in at build time through `LW_JOIN_EUI`, `LW_DEV_EUI`,
    /// `LW_NWK_KEY` and `LW_APP_KEY`.  Unset variables read as zero.
    pub fn from_build_env() -> Result<Self, IdentityParseError> {
        Self::parse(
            option_env!("LW_JOIN_EUI").unwrap_or(""),
            option_env!("LW_DEV_EUI").unwrap_or(""),
            option_env!("LW_NWK_KEY").unwrap_or(""),
            option_env!("LW_APP_KEY").unwrap_or(""),
        )
    }

    /// Parse hex strings.  Empty strings read as zero; separators
    /// (`:`, `-`, spaces) are ignored.
    pub fn parse(
        join_eui: &str,
        dev_eui: &str,
        nwk_key: &str,
        app_key: &str,
    ) -> Result<Self, IdentityParseError> {
        let mut join = [0u8; 8];
        let mut dev = [0u8; 8];
        let mut nwk = [0u8; 16];
        let mut app = [0u8; 16];
        decode_hex(join_eui, &mut join).map_err(|_| IdentityParseError("LW_JOIN_EUI"))?;
        decode_hex(dev_eui, &mut dev).map_err(|_| IdentityParseError("LW_DEV_EUI"))?;
        decode_hex(nwk_key, &mut nwk).map_err(|_| IdentityParseError("LW_NWK_KEY"))?;
        decode_hex(app_key, &mut app).map_err(|_| IdentityParseError("LW_APP_KEY"))?;
        Ok(Self::new(
            u64::from_be_bytes(join),
            u64::from_be_bytes(dev),
            nwk,
            app,
        ))
    }

    /// A build without root keys cannot join.
    pub fn is_provisioned(&self) -> bool {
        self.dev_eui != 0 && self.nwk_key != [0; 16] && self.app_key != [0; 16]
    }

    /// Replace an unset device EUI (e.g. with one derived from the factory MAC).
    pub fn with_fallback_dev_eui(mut self, eui: u64) -> Self {
        if self.dev_eui == 0 {
            self.dev_eui = eui;
        }
        self
    }
}

fn decode_hex(text: &str, out: &mut [u8]) -> Result<(), hex::FromHexError> {
    let mut digits = heapless::String::<64>::new();
    for c in text.chars().filter(|c| !matches!(c, ':' | '-' | ' ')) {
        digits.push(c).map_err(|_| hex::FromHexError::InvalidStringLength)?;
    }
    if digits.is_empty() {
        out.fill(0);
        return Ok(());
    }
    hex::decode_to_slice(digits.as_str(), out)
}
