//! Analog potentiometer with EMA smoothing and a noise floor.
//!
//! ```text
//! raw ──▶ filtered = α·raw + (1-α)·filtered ──▶ min + filtered/full_scale·(max-min)
//!                         │
//!                         └─ |filtered - last reported| ≥ threshold ⇒ changed
//! ```
//!
//! The threshold is measured against the last *reported* value, so a slow
//! drift is reported once it accumulates rather than swallowed step by step.
//! Without bounds the filtered raw value is reported as-is.

use crate::app::ports::{GpioPort, PinMode};
use crate::config::NodeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Potentiometer {
    id: u8,
    pin: i32,
    alpha: f32,
    threshold: f32,
    min_interval_ms: u32,
    full_scale: f32,
    bounds: Option<(f32, f32)>,
    filtered: f32,
    reported: f32,
    last_sample_ms: u32,
    changed: bool,
}

impl Potentiometer {
    pub fn new(id: u8, pin: i32, config: &NodeConfig) -> Self {
        Self {
            id,
            pin,
            alpha: config.pot_ema_alpha,
            threshold: config.pot_noise_threshold,
            min_interval_ms: config.pot_min_sample_interval_ms,
            full_scale: f32::from(config.adc_full_scale),
            bounds: None,
            filtered: 0.0,
            reported: 0.0,
            last_sample_ms: 0,
            changed: false,
        }
    }

    pub const fn id(&self) -> u8 {
        self.id
    }

    pub const fn pin(&self) -> i32 {
        self.pin
    }

    /// Seed the filter with one raw sample.
    pub fn activate<G: GpioPort>(&mut self, gpio: &mut G, now_ms: u32) {
        gpio.configure_pin(self.pin, PinMode::Analog);
        self.filtered = f32::from(gpio.read_analog(self.pin));
        self.reported = self.filtered;
        self.last_sample_ms = now_ms;
        self.changed = false;
    }

    /// Sample (at most once per minimum interval), filter, rescale.
    pub fn get_value<G: GpioPort>(&mut self, gpio: &mut G, now_ms: u32) -> f32 {
        if now_ms.wrapping_sub(self.last_sample_ms) < self.min_interval_ms {
            self.changed = false;
            return self.value();
        }
        self.last_sample_ms = now_ms;

        let raw = f32::from(gpio.read_analog(self.pin));
        self.filtered = self.alpha * raw + (1.0 - self.alpha) * self.filtered;

        self.changed = (self.filtered - self.reported).abs() >= self.threshold;
        if self.changed {
            self.reported = self.filtered;
        }
        self.value()
    }

    /// Current filtered reading in application units.
    pub fn value(&self) -> f32 {
        match self.bounds {
            Some((min, max)) => min + (self.filtered / self.full_scale).clamp(0.0, 1.0) * (max - min),
            None => self.filtered,
        }
    }

    pub const fn has_changed(&self) -> bool {
        self.changed
    }

    /// Ignored unless both ends are finite and `min < max`.
    pub fn set_bounds(&mut self, min: f32, max: f32) {
        if min.is_finite() && max.is_finite() && min < max {
            self.bounds = Some((min, max));
        }
    }
}
