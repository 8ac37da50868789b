//! GPIO / peripheral pin assignments for the grid node board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers. All node roles share one board layout; a role
//! only decides which component sockets are populated.

use crate::protocol::Direction;

// ---------------------------------------------------------------------------
// Direction lines (shared with the neighbouring board on each edge)
// ---------------------------------------------------------------------------

/// Top edge connector signal line.
pub const DIR_TOP_GPIO: i32 = 4;
/// Right edge connector signal line.
pub const DIR_RIGHT_GPIO: i32 = 5;
/// Bottom edge connector signal line.
pub const DIR_BOTTOM_GPIO: i32 = 6;
/// Left edge connector signal line.
pub const DIR_LEFT_GPIO: i32 = 7;

/// Direction pins in [`Direction`] index order (top, right, bottom, left).
pub const DIRECTION_GPIOS: [i32; Direction::COUNT] =
    [DIR_TOP_GPIO, DIR_RIGHT_GPIO, DIR_BOTTOM_GPIO, DIR_LEFT_GPIO];

// ---------------------------------------------------------------------------
// Multi-drop bus (half-duplex UART through an RS-485 transceiver)
// ---------------------------------------------------------------------------

pub const BUS_TX_GPIO: i32 = 17;
pub const BUS_RX_GPIO: i32 = 18;
/// Transceiver driver-enable (HIGH while transmitting).
pub const BUS_DE_GPIO: i32 = 8;
pub const BUS_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// Component sockets
// ---------------------------------------------------------------------------

/// Analog input for the potentiometer socket (ADC1).
pub const POT_ADC_GPIO: i32 = 1;
/// Buttons are active-low with the internal pull-up enabled.
pub const BUTTON_GPIOS: [i32; 2] = [9, 10];
/// Quadrature encoder sockets as (A, B) pairs.
pub const ENCODER_GPIOS: [(i32, i32); 2] = [(11, 12), (13, 14)];

/// ADC1 channel behind [`POT_ADC_GPIO`] (GPIO1 is ADC1_CH0 on the ESP32-S3).
pub const POT_ADC_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Role straps and host link
// ---------------------------------------------------------------------------

/// Active-low strap inputs, least significant bit first. Read once at boot;
/// the value is the node-type wire value of the populated sockets.
pub const ROLE_STRAP_GPIOS: [i32; 3] = [15, 16, 21];

pub const HOST_BAUD: u32 = 115_200;
