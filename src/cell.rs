use std::num::NonZero;

use crate::label::Label;

/// Classification of one cell of the padded working board.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum WorkingCell {
    /// Part of the ring surrounding the puzzle; never on any path.
    Sentinel,
    /// A given endpoint of the path for `label`.
    Terminus {
        /// Label of the path ending here.
        label: NonZero<Label>,
    },
    /// A path candidate: may stay unused or join exactly one path.
    #[default]
    Empty,
}

impl WorkingCell {
    /// Classify a raw puzzle value.
    pub(crate) fn from_label(value: Label) -> Self {
        match NonZero::new(value) {
            Some(label) => Self::Terminus { label },
            None => Self::Empty,
        }
    }

    /// The endpoint label of this cell, if it is a [`Terminus`](Self::Terminus).
    pub fn terminus(&self) -> Option<NonZero<Label>> {
        match self {
            Self::Terminus { label } => Some(*label),
            _ => None,
        }
    }
}
