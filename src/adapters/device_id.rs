//! Device identity derived from the ESP32 factory MAC address.
//!
//! When a build carries no DevEUI, the node falls back to an EUI-64 built
//! from the eFuse MAC by inserting `FF:FE` in the middle (the usual
//! EUI-48 → EUI-64 expansion).  It is stable across reboots and unique per
//! chip, so it can be registered on the network server as-is.

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// `AA:BB:CC:DD:EE:FF` → `AABBCCFFFEDDEEFF`.
pub fn eui64_from_mac(mac: &MacAddress) -> u64 {
    u64::from_be_bytes([mac[0], mac[1], mac[2], 0xFF, 0xFE, mac[3], mac[4], mac[5]])
}

/// Hex form for logs and network-server registration.
pub fn eui_string(eui: u64) -> heapless::String<16> {
    let mut s = heapless::String::<16>::new();
    use core::fmt::Write;
    let _ = write!(s, "{:016X}", eui);
    s
}
