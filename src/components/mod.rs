//! Input components polled by a node.
//!
//! A closed set of variants behind one tagged union, dispatched by `match`:
//!
//! | Variant         | Pins    | Value                          | Bounds            |
//! |-----------------|---------|--------------------------------|-------------------|
//! | `Button`        | 1 dig.  | 0 / 1, active-low              | ignored           |
//! | `Potentiometer` | 1 ADC   | EMA-filtered, rescaled         | `min`, `max`      |
//! | `RotaryEncoder` | 2 dig.  | accumulated steps, wrapping    | `min`, `max`, `step` |
//!
//! Construction records wiring only. [`Component::activate`] configures the
//! pins and takes the baseline sample; until then the direction probe may
//! still own the shared lines.

pub mod button;
pub mod potentiometer;
pub mod rotary_encoder;

pub use button::Button;
pub use potentiometer::Potentiometer;
pub use rotary_encoder::RotaryEncoder;

use log::{debug, warn};

use crate::app::ports::GpioPort;
use crate::config::NodeConfig;
use crate::pins;
use crate::protocol::{BoundsData, ComponentKind, NodeType};

/// Most components any role carries (the master panel).
pub const MAX_COMPONENTS: usize = 3;

pub type ComponentSet = heapless::Vec<Component, MAX_COMPONENTS>;

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Button(Button),
    Potentiometer(Potentiometer),
    RotaryEncoder(RotaryEncoder),
}

impl Component {
    pub fn id(&self) -> u8 {
        match self {
            Self::Button(c) => c.id(),
            Self::Potentiometer(c) => c.id(),
            Self::RotaryEncoder(c) => c.id(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Button(_) => ComponentKind::Button,
            Self::Potentiometer(_) => ComponentKind::Potentiometer,
            Self::RotaryEncoder(_) => ComponentKind::RotaryEncoder,
        }
    }

    pub fn activate<G: GpioPort>(&mut self, gpio: &mut G, now_ms: u32) {
        match self {
            Self::Button(c) => c.activate(gpio),
            Self::Potentiometer(c) => c.activate(gpio, now_ms),
            Self::RotaryEncoder(c) => c.activate(gpio),
        }
    }

    /// Sample, filter and store. Non-blocking.
    pub fn get_value<G: GpioPort>(&mut self, gpio: &mut G, now_ms: u32) -> f32 {
        match self {
            Self::Button(c) => c.get_value(gpio),
            Self::Potentiometer(c) => c.get_value(gpio, now_ms),
            Self::RotaryEncoder(c) => c.get_value(gpio),
        }
    }

    /// Last sampled value, without sampling again.
    pub fn value(&self) -> f32 {
        match self {
            Self::Button(c) => c.value(),
            Self::Potentiometer(c) => c.value(),
            Self::RotaryEncoder(c) => c.value(),
        }
    }

    /// Change flag from the most recent [`get_value`](Self::get_value).
    pub fn has_changed(&self) -> bool {
        match self {
            Self::Button(c) => c.has_changed(),
            Self::Potentiometer(c) => c.has_changed(),
            Self::RotaryEncoder(c) => c.has_changed(),
        }
    }

    /// Apply bounds addressed to this component. Returns whether they matched.
    pub fn set_bounds(&mut self, bounds: &BoundsData) -> bool {
        if bounds.kind != self.kind() || bounds.component_id != self.id() {
            return false;
        }
        match self {
            Self::Button(_) => {}
            Self::Potentiometer(c) => c.set_bounds(bounds.min, bounds.max),
            Self::RotaryEncoder(c) => c.set_bounds(bounds.min, bounds.max, bounds.step),
        }
        true
    }
}

/// The fixed component set of a role, ids assigned in poll order.
///
/// Potentiometers first, then encoders, then buttons. [`NodeType::Empty`]
/// yields no components.
pub fn build_components(node_type: NodeType, config: &NodeConfig) -> ComponentSet {
    let counts = node_type.counts();
    let mut set = ComponentSet::new();

    for _ in 0..counts.pot {
        let id = set.len() as u8;
        push(&mut set, Component::Potentiometer(Potentiometer::new(id, pins::POT_ADC_GPIO, config)));
    }
    for &pair in pins::ENCODER_GPIOS.iter().take(usize::from(counts.rot)) {
        let id = set.len() as u8;
        push(&mut set, Component::RotaryEncoder(RotaryEncoder::new(id, pair, config)));
    }
    for &pin in pins::BUTTON_GPIOS.iter().take(usize::from(counts.but)) {
        let id = set.len() as u8;
        push(&mut set, Component::Button(Button::new(id, pin)));
    }

    debug!("components for {node_type:?}: {}", set.len());
    set
}

fn push(set: &mut ComponentSet, component: Component) {
    if let Err(dropped) = set.push(component) {
        warn!("component set full, dropping {:?} {}", dropped.kind(), dropped.id());
    }
}
