//! Node roles and the component counts each role implies.

use serde::{Deserialize, Serialize};

/// The fixed set of components a node exposes.
///
/// Any unrecognised wire value decodes to [`NodeType::Empty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    #[default]
    Empty = 0,
    Button = 1,
    Potentiometer = 2,
    RotaryEncoder = 3,
    /// The master's own panel: one rotary encoder and two buttons.
    MasterPanel = 4,
    DualRotary = 5,
}

impl NodeType {
    pub fn from_wire(raw: u8) -> Self {
        match raw {
            1 => Self::Button,
            2 => Self::Potentiometer,
            3 => Self::RotaryEncoder,
            4 => Self::MasterPanel,
            5 => Self::DualRotary,
            _ => Self::Empty,
        }
    }

    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    /// Component counts wired to a node of this role.
    pub const fn counts(self) -> ComponentCounts {
        match self {
            Self::Empty => ComponentCounts::NONE,
            Self::Button => ComponentCounts { pot: 0, rot: 0, but: 1 },
            Self::Potentiometer => ComponentCounts { pot: 1, rot: 0, but: 0 },
            Self::RotaryEncoder => ComponentCounts { pot: 0, rot: 1, but: 0 },
            Self::MasterPanel => ComponentCounts { pot: 0, rot: 1, but: 2 },
            Self::DualRotary => ComponentCounts { pot: 0, rot: 2, but: 0 },
        }
    }
}

/// Number of potentiometers, rotary encoders and buttons on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentCounts {
    pub pot: u8,
    pub rot: u8,
    pub but: u8,
}

impl ComponentCounts {
    pub const NONE: Self = Self { pot: 0, rot: 0, but: 0 };

    pub const fn total(self) -> usize {
        self.pot as usize + self.rot as usize + self.but as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_roles_have_one_component() {
        for t in [NodeType::Button, NodeType::Potentiometer, NodeType::RotaryEncoder] {
            assert_eq!(t.counts().total(), 1, "{t:?}");
        }
    }

    #[test]
    fn master_panel_counts() {
        assert_eq!(NodeType::MasterPanel.counts(), ComponentCounts { pot: 0, rot: 1, but: 2 });
    }

    #[test]
    fn wire_roundtrip_for_known_roles() {
        for raw in 0..=5u8 {
            assert_eq!(NodeType::from_wire(raw).to_wire(), raw);
        }
    }

    #[test]
    fn unknown_role_is_empty_with_no_components() {
        for raw in [6u8, 42, 111, 255] {
            let t = NodeType::from_wire(raw);
            assert_eq!(t, NodeType::Empty);
            assert_eq!(t.counts(), ComponentCounts::NONE);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn counts_are_a_pure_function_of_the_wire_byte(raw in any::<u8>()) {
            let a = NodeType::from_wire(raw).counts();
            let b = NodeType::from_wire(raw).counts();
            prop_assert_eq!(a, b);
            if raw > 5 {
                prop_assert_eq!(a, ComponentCounts::NONE);
            }
        }
    }
}
