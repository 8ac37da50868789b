//! Compass directions of the four edge connectors and grid coordinates.

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

impl Direction {
    pub const COUNT: usize = 4;
    pub const ALL: [Direction; Self::COUNT] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    pub fn from_index(idx: u8) -> Result<Self, ProtocolError> {
        match idx {
            0 => Ok(Self::Top),
            1 => Ok(Self::Right),
            2 => Ok(Self::Bottom),
            3 => Ok(Self::Left),
            other => Err(ProtocolError::BadDirection(other)),
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The side of the neighbouring board that shares this edge.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// Unit step on the grid, y growing towards `Top`.
    pub const fn offset(self) -> (i8, i8) {
        match self {
            Self::Top => (0, 1),
            Self::Right => (1, 0),
            Self::Bottom => (0, -1),
            Self::Left => (-1, 0),
        }
    }

    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of directions packed into the low nibble of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionSet(u8);

impl DirectionSet {
    pub const EMPTY: Self = Self(0);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.mask();
    }

    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.mask();
    }

    pub const fn contains(self, dir: Direction) -> bool {
        self.0 & dir.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for dir in iter {
            set.insert(dir);
        }
        set
    }
}

/// Grid coordinate relative to the master at (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i8,
    pub y: i8,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// Neighbouring cell in `dir`, or `None` at the edge of the coordinate range.
    pub fn step(self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.offset();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }
}
