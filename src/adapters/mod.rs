//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                 |
//! |-------------|---------------------|-----------------------------|
//! | `hardware`  | ActuatorPort        | TRIAC dimmer, fan PWM, GPIO |
//! |             | VoltageSource       | ESP32 ADC1 (calibrated)     |
//! | `display`   | DisplayPort         | 16x2 text buffer + log      |
//! | `log_sink`  | EventSink           | Serial log output           |
//! | `tcp_link`  | TelemetryPort       | TCP client to the peer      |
//! |             | CommandPort         |                             |
//! | `time`      | PulseTimer          | ESP32 system timer          |
//! | `wifi`      | (none)              | ESP-IDF WiFi STA            |

pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod tcp_link;
pub mod time;
pub mod wifi;
