//! Board drivers: one-shot peripheral setup and the OLED panel.

pub mod hw_init;
pub mod oled;
