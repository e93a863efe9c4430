use strum::VariantArray;

use crate::location::{Coord, Location};

/// The four orthogonal steps between square cells of a rectangular board.
#[derive(Copy, Clone, VariantArray, Eq, PartialEq, Hash, Debug, Ord, PartialOrd)]
pub enum SquareStep {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards column 0.
    Left,
    /// Away from column 0.
    Right,
}

impl SquareStep {
    /// Take the step from `location` and return the resultant [`Location`].
    ///
    /// No bounds are checked; stepping off row or column 0 wraps around to a huge coordinate.
    /// Callers on the padded working board never leave it, since every interior cell has a sentinel on each side.
    pub fn attempt_from(&self, location: Location) -> Location {
        match self {
            Self::Up => location.offset_by((-1, 0)),
            Self::Down => location.offset_by((1, 0)),
            Self::Left => location.offset_by((0, -1)),
            Self::Right => location.offset_by((0, 1)),
        }
    }

    /// Take the step from `location` on a board of `dims` `(rows, columns)`, or [`None`] if it would leave the board.
    pub fn attempt_within(&self, location: Location, dims: (Coord, Coord)) -> Option<Location> {
        let Location(row, col) = location;
        if row >= dims.0 || col >= dims.1 {
            return None;
        }

        let inside = match self {
            Self::Up => row > 0,
            Self::Down => row < dims.0 - 1,
            Self::Left => col > 0,
            Self::Right => col < dims.1 - 1,
        };

        inside.then(|| self.attempt_from(location))
    }

    /// All neighbours of `location` "in theory", one per step.
    pub(crate) fn neighbors_of(location: Location) -> impl Iterator<Item = (Self, Location)> {
        Self::VARIANTS.iter().map(move |step| (*step, step.attempt_from(location)))
    }
}
