use ndarray::Array2;
use thiserror::Error;

use crate::board::Board;
use crate::label::Label;
use crate::location::{Dimension, Location};

/// Reasons a builder may become invalid while building.
#[derive(Copy, Clone, Debug, Error, Eq, PartialEq)]
pub enum BuilderInvalidReason {
    /// A terminus was placed outside the bounds specified by `dims` on the builder.
    #[error("terminus placed outside the board")]
    FeatureOutOfBounds,
    /// A terminus was placed on a cell already holding one.
    #[error("terminus placed on an occupied cell")]
    LocationOccupied,
}

/// Incrementally place pairs of termini on an empty rectangular board, then [`build`](Self::build) a [`Board`].
///
/// The first pair added gets label 1, the next label 2, and so on.
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
///
/// Once a builder is invalid, every further mutation is ignored and [`build`](Self::build) reports why.
#[derive(Clone, Debug)]
pub struct BoardBuilder {
    // rows, columns
    dims: (Dimension, Dimension),
    cells: Array2<Label>,
    pairs: Vec<(Location, Location)>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl BoardBuilder {
    /// Construct a new empty builder with the specified dimensions, in `(rows, columns)` order.
    pub fn with_dims(dims: (Dimension, Dimension)) -> Self {
        Self {
            dims,
            cells: Array2::zeros((dims.0.get(), dims.1.get())),
            pairs: Default::default(),
            invalid_reasons: Default::default(),
        }
    }

    fn contains(&self, location: Location) -> bool {
        location.0 < self.dims.0.get() && location.1 < self.dims.1.get()
    }

    /// Add termini or "flow endpoints" under the next unused label. The order in which `locations` are specified does not matter.
    ///
    /// May cause the builder to enter a [`FeatureOutOfBounds`](BuilderInvalidReason::FeatureOutOfBounds) invalid state if either location is out of bounds,
    /// or a [`LocationOccupied`](BuilderInvalidReason::LocationOccupied) one if either already holds a terminus or both are the same.
    /// If the builder is already in an invalid state, this function does nothing.
    pub fn add_termini(&mut self, locations: (Location, Location)) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        for location in [locations.0, locations.1] {
            if !self.contains(location) {
                self.invalid_reasons.push(BuilderInvalidReason::FeatureOutOfBounds);
                return self;
            }
        }

        if locations.0 == locations.1 || [locations.0, locations.1].iter().any(|location| self.cells[location.as_index()] != 0) {
            self.invalid_reasons.push(BuilderInvalidReason::LocationOccupied);
            return self;
        }

        self.pairs.push(locations);
        // labels start at 1
        let label = self.pairs.len() as Label;
        for location in [locations.0, locations.1] {
            self.cells[location.as_index()] = label;
        }

        self
    }

    /// Remove the most recently added pair of termini.
    ///
    /// If the builder is in an invalid state or no termini are present, this function does nothing.
    pub fn pop_termini(&mut self) -> &mut Self {
        if !self.invalid_reasons.is_empty() {
            return self;
        }

        if let Some((first, second)) = self.pairs.pop() {
            for location in [first, second] {
                self.cells[location.as_index()] = 0;
            }
        }

        self
    }

    /// Check the validity of this builder, ensuring no [`BuilderInvalidReason`] condition has arisen.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`Board`].
    /// If the builder is invalid for any reason, a reference to a [`Vec`] of [`BuilderInvalidReason`] will indicate why.
    pub fn build(&self) -> Result<Board, &Vec<BuilderInvalidReason>> {
        if !self.invalid_reasons.is_empty() {
            return Err(&self.invalid_reasons);
        }

        Ok(Board { cells: self.cells.clone() })
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use crate::builder::{BoardBuilder, BuilderInvalidReason};
    use crate::location::Location;

    fn builder() -> BoardBuilder {
        BoardBuilder::with_dims((NonZero::new(2).unwrap(), NonZero::new(3).unwrap()))
    }

    #[test]
    fn labels_pairs_in_order() {
        let board = builder()
            .add_termini((Location(0, 0), Location(0, 2)))
            .add_termini((Location(1, 2), Location(1, 0)))
            .build()
            .unwrap();

        assert_eq!(board.to_string(), "1 0 1\n2 0 2\n");
    }

    #[test]
    fn pop_frees_the_label() {
        let board = builder()
            .add_termini((Location(0, 0), Location(0, 2)))
            .add_termini((Location(1, 0), Location(1, 1)))
            .pop_termini()
            .add_termini((Location(1, 1), Location(1, 2)))
            .build()
            .unwrap();

        assert_eq!(board.to_string(), "1 0 1\n0 2 2\n");
    }

    #[test]
    fn invalid_stays_invalid() {
        let mut builder = builder();
        builder.add_termini((Location(0, 0), Location(2, 0)));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::FeatureOutOfBounds]));

        builder.add_termini((Location(0, 0), Location(0, 1)));
        assert_eq!(builder.build().unwrap_err(), &vec![BuilderInvalidReason::FeatureOutOfBounds]);
    }

    #[test]
    fn rejects_overlap() {
        let mut builder = builder();
        builder.add_termini((Location(0, 0), Location(0, 1)))
            .add_termini((Location(0, 1), Location(1, 1)));
        assert_eq!(builder.is_valid(), Some(&vec![BuilderInvalidReason::LocationOccupied]));

        let mut builder = self::builder();
        builder.add_termini((Location(1, 1), Location(1, 1)));
        assert!(builder.is_valid().is_some());
    }
}
