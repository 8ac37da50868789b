//! Telemetry and configuration records that reference a live component.

use crate::error::ProtocolError;

/// Component variant tag as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Button,
    Potentiometer,
    RotaryEncoder,
}

impl ComponentKind {
    pub const fn wire_char(self) -> u8 {
        match self {
            Self::Button => b'B',
            Self::Potentiometer => b'P',
            Self::RotaryEncoder => b'R',
        }
    }

    pub fn from_wire(raw: u8) -> Result<Self, ProtocolError> {
        match raw {
            b'B' => Ok(Self::Button),
            b'P' => Ok(Self::Potentiometer),
            b'R' => Ok(Self::RotaryEncoder),
            other => Err(ProtocolError::BadComponentKind(other)),
        }
    }
}

/// One detected change event, sent node → master → host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Data {
    pub node_id: u8,
    pub id: u8,
    pub kind: ComponentKind,
    pub value: f32,
}

/// Rescaling parameters pushed from the master to one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsData {
    pub kind: ComponentKind,
    pub component_id: u8,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl BoundsData {
    /// Decoders reject bounds with a NaN or infinite field.
    pub fn check_finite(self) -> Result<Self, ProtocolError> {
        if self.min.is_finite() && self.max.is_finite() && self.step.is_finite() {
            Ok(self)
        } else {
            Err(ProtocolError::NonFiniteBounds)
        }
    }

    /// Finite fields and `min < max`; anything else is ignored by the
    /// receiving component.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.step.is_finite() && self.min < self.max
    }
}
