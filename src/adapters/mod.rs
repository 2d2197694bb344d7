//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                | Connects to                    |
//! |-------------|---------------------------|--------------------------------|
//! | `board`     | BoardPort, DisplayPort    | VEXT/ADC/temp sensor, SSD1306  |
//! | `device_id` | —                         | eFuse factory MAC              |
//! | `log_sink`  | EventSink                 | Serial log output              |
//! | `nvs`       | BlobStore, ConfigPort     | NVS / in-memory store          |
//! | `radio`     | RadioPort                 | SX1262 + LoRaWAN stack (C shim)|
//! | `rtc`       | RetainedMemory            | RTC slow memory                |

pub mod board;
pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod radio;
pub mod rtc;
