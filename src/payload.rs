//! Application uplink payload.
//!
//! ```text
//! byte 0     sample      (0–99)
//! bytes 1–2  value       (0–1999, big-endian)
//! bytes 3–4  battery_mv  (big-endian)
//! ```

/// Encoded payload length.
pub const UPLINK_LEN: usize = 5;

/// One uplink worth of application data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UplinkPayload {
    pub sample: u8,
    pub value: u16,
    pub battery_mv: u16,
}

impl UplinkPayload {
    pub fn to_bytes(&self) -> [u8; UPLINK_LEN] {
        let [v_hi, v_lo] = self.value.to_be_bytes();
        let [b_hi, b_lo] = self.battery_mv.to_be_bytes();
        [self.sample, v_hi, v_lo, b_hi, b_lo]
    }
}
