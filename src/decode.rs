use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array2;
use thiserror::Error;
use tracing::trace;

use crate::board::Board;
use crate::formulation::NumberlinkModel;
use crate::label::Label;
use crate::location::Location;
use crate::solver::Solution;

/// An assignment that cannot be read back as a labeled grid.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DecodeError {
    /// More than one label claims the cell.
    #[error("cell {location} is on the paths of labels {}", .labels.iter().join(", "))]
    Conflict {
        /// The cell, on the original board.
        location: Location,
        /// Every label whose occupancy is one there, ascending.
        labels: Vec<Label>,
    },
    /// An occupancy variable holds something other than 0 or 1, or has no value at all.
    #[error("occupancy of label {label} at {location} is {value:?}")]
    NonBinary {
        /// The cell, on the original board.
        location: Location,
        /// The label whose occupancy variable it is.
        label: Label,
        /// What the solver assigned, if anything.
        value: Option<i64>,
    },
}

/// Read the labeled grid out of `solution`: each cell takes the label whose occupancy is one, or `0` if there is none.
///
/// The sentinel ring is dropped, so the result has the dimensions of the original puzzle.
pub fn decode(model: &NumberlinkModel, solution: &Solution) -> Result<Board, DecodeError> {
    let (rows, cols) = model.dims();
    let mut cells = Array2::<Label>::zeros((rows, cols));

    for ((row, col), cell) in cells.indexed_iter_mut() {
        let location = Location(row, col);
        let mut on = Vec::new();

        for label in (1..=model.label_count()).filter_map(NonZero::new) {
            let value = model.occupancy(location, label).and_then(|var| solution.value(var));
            match value {
                Some(0) => {}
                Some(1) => on.push(label.get()),
                value => return Err(DecodeError::NonBinary { location, label: label.get(), value }),
            }

            if let Some(count) = model.neighbor_count(location, label).and_then(|var| solution.value(var)) {
                trace!(%location, label = label.get(), count, "neighbours on path");
            }
        }

        *cell = match on.as_slice() {
            [] => 0,
            [label] => *label,
            _ => return Err(DecodeError::Conflict { location, labels: on }),
        };
    }

    Ok(Board { cells })
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use crate::board::Board;
    use crate::decode::{decode, DecodeError};
    use crate::formulation::NumberlinkModel;
    use crate::location::Location;
    use crate::model::Sense;
    use crate::solver::{Solution, Status};

    fn assignment(model: &NumberlinkModel, on: &[(Location, u32)]) -> Solution {
        let mut values = vec![0; model.model().variables().len()];
        for (location, label) in on {
            let var = model.occupancy(*location, NonZero::new(*label).unwrap()).unwrap();
            values[var.index()] = 1;
        }

        Solution { status: Status::Optimal, objective_value: Some(on.len() as i64), objective_bound: on.len() as i64, values }
    }

    #[test]
    fn reads_labels_and_drops_padding() {
        let puzzle = Board::from_rows(vec![vec![1, 0, 1], vec![2, 0, 2]]).unwrap();
        let model = NumberlinkModel::build(&puzzle.pad(), Sense::Minimize);
        let solution = assignment(&model, &[
            (Location(0, 0), 1), (Location(0, 1), 1), (Location(0, 2), 1),
            (Location(1, 0), 2), (Location(1, 2), 2),
        ]);

        let board = decode(&model, &solution).unwrap();
        assert_eq!(board, Board::from_rows(vec![vec![1, 1, 1], vec![2, 0, 2]]).unwrap());
    }

    #[test]
    fn rejects_shared_cells() {
        let puzzle = Board::from_rows(vec![vec![1, 2, 0, 2, 1]]).unwrap();
        let model = NumberlinkModel::build(&puzzle.pad(), Sense::Minimize);
        let solution = assignment(&model, &[(Location(0, 2), 1), (Location(0, 2), 2)]);

        assert_eq!(
            decode(&model, &solution),
            Err(DecodeError::Conflict { location: Location(0, 2), labels: vec![1, 2] })
        );
    }

    #[test]
    fn rejects_missing_values() {
        let puzzle = Board::from_rows(vec![vec![1, 1]]).unwrap();
        let model = NumberlinkModel::build(&puzzle.pad(), Sense::Minimize);
        let solution = Solution::infeasible(0);

        assert!(matches!(decode(&model, &solution), Err(DecodeError::NonBinary { value: None, .. })));
    }
}
