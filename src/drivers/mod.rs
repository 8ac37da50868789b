//! Board-level drivers built on the GPIO port.

pub mod direction_pins;
pub mod role_strap;
