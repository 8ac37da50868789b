//! Momentary push button, active-low.
//!
//! The switch shorts the pin to ground against the internal pull-up, so a
//! low line means pressed. No debouncing: the bus only sees changes between
//! two polls, and the loop period already filters contact bounce.

use embedded_hal::digital::PinState;

use crate::app::ports::{GpioPort, PinMode};

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    id: u8,
    pin: i32,
    pressed: bool,
    changed: bool,
}

impl Button {
    /// Records the wiring only; the pin is left untouched until [`activate`](Self::activate).
    pub const fn new(id: u8, pin: i32) -> Self {
        Self {
            id,
            pin,
            pressed: false,
            changed: false,
        }
    }

    pub const fn id(&self) -> u8 {
        self.id
    }

    pub const fn pin(&self) -> i32 {
        self.pin
    }

    pub fn activate<G: GpioPort>(&mut self, gpio: &mut G) {
        gpio.configure_pin(self.pin, PinMode::InputPullUp);
        self.pressed = gpio.read_digital(self.pin) == PinState::Low;
        self.changed = false;
    }

    /// 1.0 while pressed, 0.0 otherwise.
    pub fn get_value<G: GpioPort>(&mut self, gpio: &mut G) -> f32 {
        let pressed = gpio.read_digital(self.pin) == PinState::Low;
        self.changed = pressed != self.pressed;
        self.pressed = pressed;
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.pressed { 1.0 } else { 0.0 }
    }

    pub const fn has_changed(&self) -> bool {
        self.changed
    }
}
