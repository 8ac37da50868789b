//! Direction-line probe — the physical primitive under discovery.
//!
//! ## Hardware
//!
//! Each edge connector carries one open-drain style signal line shared with
//! the neighbouring board. A sensing side is an input with pull-up; a
//! signalling side drives its line low. Either board pulling low makes the
//! line read low on both ends, so a low read means "my neighbour on this
//! side is signalling".
//!
//! The driver only knows lines and levels, never node ids.

use embedded_hal::digital::PinState;
use log::debug;

use crate::app::ports::{GpioPort, PinMode};
use crate::pins;
use crate::protocol::{Direction, DirectionSet};

pub struct DirectionPins {
    gpios: [i32; Direction::COUNT],
    /// Lines this board currently drives low.
    driven: DirectionSet,
}

impl DirectionPins {
    pub const fn new(gpios: [i32; Direction::COUNT]) -> Self {
        Self {
            gpios,
            driven: DirectionSet::EMPTY,
        }
    }

    /// Pin map of the production board.
    pub const fn board() -> Self {
        Self::new(pins::DIRECTION_GPIOS)
    }

    pub const fn gpio(&self, dir: Direction) -> i32 {
        self.gpios[dir.index()]
    }

    pub const fn driven(&self) -> DirectionSet {
        self.driven
    }

    /// Every line back to a pulled-up input.
    pub fn probe_all_as_input<G: GpioPort>(&mut self, gpio: &mut G) {
        self.probe_subset_as_input(gpio, Direction::ALL.into_iter().collect());
    }

    /// Switch only `dirs` to pulled-up inputs; other lines keep their mode.
    pub fn probe_subset_as_input<G: GpioPort>(&mut self, gpio: &mut G, dirs: DirectionSet) {
        for dir in dirs.iter() {
            gpio.configure_pin(self.gpio(dir), PinMode::InputPullUp);
            self.driven.remove(dir);
        }
    }

    /// Signal the neighbour on `dir` by driving the shared line low.
    pub fn pull_direction_low<G: GpioPort>(&mut self, gpio: &mut G, dir: Direction) {
        let pin = self.gpio(dir);
        gpio.configure_pin(pin, PinMode::Output);
        gpio.write_digital(pin, PinState::Low);
        self.driven.insert(dir);
        debug!("direction {dir:?} (gpio {pin}) driven low");
    }

    /// Whether a sensing line reads low. Lines we drive ourselves read `false`.
    pub fn is_low<G: GpioPort>(&self, gpio: &mut G, dir: Direction) -> bool {
        !self.driven.contains(dir) && gpio.read_digital(self.gpio(dir)) == PinState::Low
    }

    pub fn is_any_low<G: GpioPort>(&self, gpio: &mut G) -> bool {
        Direction::ALL.into_iter().any(|d| self.is_low(gpio, d))
    }

    /// All sensing lines that currently read low.
    pub fn sample<G: GpioPort>(&self, gpio: &mut G) -> DirectionSet {
        Direction::ALL
            .into_iter()
            .filter(|d| self.is_low(gpio, *d))
            .collect()
    }
}
