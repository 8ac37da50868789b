//! Boot-time role strap.
//!
//! The board straps encode which sockets are populated. A strap reading of
//! [`NodeType::MasterPanel`] makes the board the grid master.

use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::{GpioPort, PinMode};
use crate::protocol::NodeType;

/// Read the straps (active-low, LSB first) and decode the node type.
pub fn read_role(gpio: &mut impl GpioPort, straps: &[i32]) -> NodeType {
    let mut raw = 0u8;
    for (bit, &pin) in straps.iter().enumerate().take(8) {
        gpio.configure_pin(pin, PinMode::InputPullUp);
        if gpio.read_digital(pin) == PinState::Low {
            raw |= 1 << bit;
        }
    }
    let role = NodeType::from_wire(raw);
    info!("role strap {raw:#05b} -> {role:?}");
    role
}
