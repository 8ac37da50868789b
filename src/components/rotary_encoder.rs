//! Two-pin quadrature rotary encoder with wrap-around.
//!
//! Every transition of pin A is one detent. Direction is -1 when A and B
//! differ after the transition, +1 when they match. The accumulated value
//! wraps: stepping past `max` lands on `min` and the other way round.

use embedded_hal::digital::PinState;

use crate::app::ports::{GpioPort, PinMode};
use crate::config::NodeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RotaryEncoder {
    id: u8,
    pin_a: i32,
    pin_b: i32,
    last_a: PinState,
    value: f32,
    min: f32,
    max: f32,
    step: f32,
    changed: bool,
}

impl RotaryEncoder {
    pub fn new(id: u8, pins: (i32, i32), config: &NodeConfig) -> Self {
        Self {
            id,
            pin_a: pins.0,
            pin_b: pins.1,
            last_a: PinState::High,
            value: config.encoder_default_min,
            min: config.encoder_default_min,
            max: config.encoder_default_max,
            step: config.encoder_default_step,
            changed: false,
        }
    }

    pub const fn id(&self) -> u8 {
        self.id
    }

    pub const fn pins(&self) -> (i32, i32) {
        (self.pin_a, self.pin_b)
    }

    pub fn activate<G: GpioPort>(&mut self, gpio: &mut G) {
        gpio.configure_pin(self.pin_a, PinMode::InputPullUp);
        gpio.configure_pin(self.pin_b, PinMode::InputPullUp);
        self.last_a = gpio.read_digital(self.pin_a);
        self.changed = false;
    }

    pub fn get_value<G: GpioPort>(&mut self, gpio: &mut G) -> f32 {
        let a = gpio.read_digital(self.pin_a);
        self.changed = a != self.last_a;
        if self.changed {
            let b = gpio.read_digital(self.pin_b);
            let direction = if a == b { 1.0 } else { -1.0 };
            self.advance(direction);
        }
        self.last_a = a;
        self.value
    }

    fn advance(&mut self, direction: f32) {
        self.value += direction * self.step;
        if self.value > self.max {
            self.value = self.min;
        } else if self.value < self.min {
            self.value = self.max;
        }
    }

    pub const fn value(&self) -> f32 {
        self.value
    }

    pub const fn has_changed(&self) -> bool {
        self.changed
    }

    /// Ignored unless both ends are finite and `min < max`. A step that is
    /// not finite and positive keeps the current one. The current value is
    /// clamped into the new range.
    pub fn set_bounds(&mut self, min: f32, max: f32, step: f32) {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return;
        }
        self.min = min;
        self.max = max;
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
        self.value = self.value.clamp(min, max);
    }
}
