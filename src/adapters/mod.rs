//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `board`    | GpioPort       | ESP32 GPIO, ADC1            |
//! |            | BusPort        | UART1 + RS-485 transceiver  |
//! |            | SerialPort     | UART0 host console          |
//! | `clock`    | (time source)  | ESP32 system timer          |
//! | `log_sink` | EventSink      | Serial log output           |
//! | `nvs`      | ConfigPort     | NVS / in-memory store       |
//! |            | StoragePort    |                             |

#[cfg(target_os = "espidf")]
pub mod board;
pub mod clock;
pub mod log_sink;
pub mod nvs;
