//! RTC slow-memory adapter.
//!
//! Implements [`RetainedMemory`].  The wake counter lives in `.rtc.data`,
//! which survives deep sleep but is zeroed by power loss or a reset.  On
//! host targets it is an ordinary static.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::RetainedMemory;

#[cfg(target_os = "espidf")]
#[unsafe(link_section = ".rtc.data")]
static WAKE_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
static WAKE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Handle onto the sleep-surviving counters.  Zero-sized; every handle sees
/// the same memory.
#[derive(Debug, Default)]
pub struct RtcRetained;

impl RtcRetained {
    pub fn new() -> Self {
        Self
    }
}

impl RetainedMemory for RtcRetained {
    fn load_wake_count(&self) -> u32 {
        WAKE_COUNT.load(Ordering::Relaxed)
    }

    fn store_wake_count(&mut self, count: u32) {
        WAKE_COUNT.store(count, Ordering::Relaxed);
    }
}
