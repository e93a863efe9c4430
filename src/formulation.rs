//! The Numberlink puzzle as an integer linear program.
//!
//! For a padded working board and labels `1..=N`:
//!
//! * `x[i, j, n]` is binary: cell `(i, j)` lies on the path of label `n`.
//! * `adj[i, j, n]` is an integer in `0..=4` defined as the number of the four neighbours of `(i, j)` lying on path `n`.
//!   It exists for every non-sentinel cell.
//!
//! Constraints:
//!
//! 1. Sentinel cells belong to no path: `x[i, j, n] = 0`.
//! 2. A cell belongs to at most one path: `Σ_n x[i, j, n] <= 1`.
//! 3. An endpoint of label `n` is on path `n` and has exactly one neighbour on it: `x[i, j, n] = 1`, `adj[i, j, n] = 1`.
//! 4. Any other cell on path `n` has exactly two neighbours on it: `2 x[i, j, n] <= adj[i, j, n] <= 4 - 2 x[i, j, n]`.
//!    With `x = 1` this pins `adj` to 2; with `x = 0` it says nothing.
//!
//! Keeping `adj` a variable of its own is what keeps constraint 4 linear.
//! The objective counts every interior `x` set to one.

use std::fmt::{Display, Formatter};
use std::num::NonZero;

use itertools::Itertools;
use ndarray::Array3;
use tracing::info;

use crate::board::{SolveError, Solved, WorkingBoard};
use crate::cell::WorkingCell;
use crate::decode::decode;
use crate::label::Label;
use crate::location::{Coord, Location};
use crate::lp::write_lp;
use crate::model::{ConstraintId, Constraint, LinExpr, Model, Sense, VarId, VarKind};
use crate::shape::SquareStep;
use crate::solver::{Solver, Status};

/// What a model variable stands for. Locations are on the padded working board.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum VarKey {
    /// `x`: the cell lies on the path of `label`.
    Occupancy {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// `adj`: how many neighbours of the cell lie on the path of `label`.
    NeighborCount {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
}

impl Display for VarKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Occupancy { location: Location(row, col), label } => write!(f, "x_{}_{}_{}", row, col, label),
            Self::NeighborCount { location: Location(row, col), label } => write!(f, "adj_{}_{}_{}", row, col, label),
        }
    }
}

/// Which rule a model constraint encodes. Locations are on the padded working board.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum ConstraintKey {
    /// `x = 0` on a sentinel.
    Sentinel {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// `adj` equals the sum of the neighbouring `x`.
    NeighborCount {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// At most one label per cell.
    SingleLabel {
        /// The cell, on the padded board.
        location: Location,
    },
    /// `x = 1` on an endpoint.
    Terminus {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// `adj = 1` on an endpoint.
    TerminusExit {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// `2 x <= adj` on a path candidate.
    PathEntered {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
    /// `adj <= 4 - 2 x` on a path candidate.
    PathNotBranched {
        /// The cell, on the padded board.
        location: Location,
        /// The path in question.
        label: NonZero<Label>,
    },
}

impl Display for ConstraintKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (name, Location(row, col), label) = match self {
            Self::Sentinel { location, label } => ("sentinel", location, Some(label)),
            Self::NeighborCount { location, label } => ("count", location, Some(label)),
            Self::SingleLabel { location } => ("single", location, None),
            Self::Terminus { location, label } => ("terminus", location, Some(label)),
            Self::TerminusExit { location, label } => ("exit", location, Some(label)),
            Self::PathEntered { location, label } => ("entered", location, Some(label)),
            Self::PathNotBranched { location, label } => ("unbranched", location, Some(label)),
        };

        match label {
            Some(label) => write!(f, "{}_{}_{}_{}", name, row, col, label),
            None => write!(f, "{}_{}_{}", name, row, col),
        }
    }
}

/// The model for one puzzle, with every variable and constraint addressable by its structured key.
#[derive(Clone, Debug)]
pub struct NumberlinkModel {
    model: Model,
    // (row, col, label - 1) on the padded board
    occupancy: Array3<VarId>,
    neighbor_counts: Array3<Option<VarId>>,
    var_keys: Vec<VarKey>,
    constraint_keys: Vec<ConstraintKey>,
    max_label: Label,
}

fn labels(max_label: Label) -> impl Iterator<Item = NonZero<Label>> + Clone {
    (1..=max_label).filter_map(NonZero::new)
}

fn slot(location: Location, label: NonZero<Label>) -> (Coord, Coord, usize) {
    (location.0, location.1, label.get() as usize - 1)
}

impl NumberlinkModel {
    /// Build the model for `board`, optimizing the number of covered cells in the direction `sense`.
    pub fn build(board: &WorkingBoard, sense: Sense) -> Self {
        let (rows, cols) = board.dims();
        let max_label = board.max_label();
        let mut model = Model::new(sense);
        let mut var_keys = Vec::new();
        let mut constraint_keys = Vec::new();

        let occupancy = Array3::from_shape_fn((rows, cols, max_label as usize), |(row, col, n)| {
            var_keys.push(VarKey::Occupancy { location: Location(row, col), label: NonZero::<Label>::MIN.saturating_add(n as Label) });
            model.add_var(VarKind::Binary)
        });
        let mut neighbor_counts = Array3::from_elem(occupancy.raw_dim(), None);

        let mut require = |model: &mut Model, key: ConstraintKey, constraint: Constraint| {
            constraint_keys.push(key);
            model.add_constraint(constraint);
        };

        for ((row, col), cell) in board.cells().indexed_iter() {
            let location = Location(row, col);
            let x = |label: NonZero<Label>| occupancy[slot(location, label)];

            if *cell == WorkingCell::Sentinel {
                for label in labels(max_label) {
                    require(&mut model, ConstraintKey::Sentinel { location, label }, LinExpr::from(x(label)).equals(0i64));
                }
                continue;
            }

            for label in labels(max_label) {
                let adj = model.add_var(VarKind::Integer { lower: 0, upper: 4 });
                var_keys.push(VarKey::NeighborCount { location, label });
                neighbor_counts[slot(location, label)] = Some(adj);

                // neighbours are in range: every non-sentinel cell is surrounded on the padded board
                let around: LinExpr = SquareStep::neighbors_of(location)
                    .map(|(_, neighbor)| occupancy[slot(neighbor, label)])
                    .sum();
                require(&mut model, ConstraintKey::NeighborCount { location, label }, LinExpr::from(adj).equals(around));
            }

            if max_label > 0 {
                require(
                    &mut model,
                    ConstraintKey::SingleLabel { location },
                    labels(max_label).map(x).sum::<LinExpr>().leq(1i64),
                );
            }

            let adj = |label: NonZero<Label>| neighbor_counts[slot(location, label)];
            match cell.terminus() {
                Some(label) => {
                    require(&mut model, ConstraintKey::Terminus { location, label }, LinExpr::from(x(label)).equals(1i64));
                    if let Some(adj) = adj(label) {
                        require(&mut model, ConstraintKey::TerminusExit { location, label }, LinExpr::from(adj).equals(1i64));
                    }
                }
                None => {
                    for label in labels(max_label) {
                        let Some(adj) = adj(label) else { continue };
                        require(&mut model, ConstraintKey::PathEntered { location, label }, (2 * x(label)).leq(adj));
                        require(
                            &mut model,
                            ConstraintKey::PathNotBranched { location, label },
                            LinExpr::from(adj).leq(LinExpr::constant(4) - 2 * x(label)),
                        );
                    }
                }
            }
        }

        // interior only; the ring is all zeroes anyway
        model.set_objective(
            (1..rows.saturating_sub(1))
                .cartesian_product(1..cols.saturating_sub(1))
                .cartesian_product(labels(max_label))
                .map(|((row, col), label)| occupancy[slot(Location(row, col), label)])
                .sum(),
        );

        Self { model, occupancy, neighbor_counts, var_keys, constraint_keys, max_label }
    }

    /// The underlying integer program.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// `N`, the number of labels modelled.
    pub fn label_count(&self) -> Label {
        self.max_label
    }

    /// `(rows, columns)` of the original, unpadded board.
    pub fn dims(&self) -> (Coord, Coord) {
        let (rows, cols, _) = self.occupancy.dim();
        (rows - 2, cols - 2)
    }

    fn contains(&self, location: Location) -> bool {
        let (rows, cols) = self.dims();
        location.0 < rows && location.1 < cols
    }

    /// The `x` variable of `label` at `location` on the original board, or [`None`] if either is out of range.
    pub fn occupancy(&self, location: Location, label: NonZero<Label>) -> Option<VarId> {
        if !self.contains(location) {
            return None;
        }
        self.occupancy.get(slot(location.padded(), label)).copied()
    }

    /// The `adj` variable of `label` at `location` on the original board, or [`None`] if either is out of range.
    pub fn neighbor_count(&self, location: Location, label: NonZero<Label>) -> Option<VarId> {
        if !self.contains(location) {
            return None;
        }
        self.neighbor_counts.get(slot(location.padded(), label)).copied().flatten()
    }

    /// What `var` stands for.
    pub fn var_key(&self, var: VarId) -> Option<VarKey> {
        self.var_keys.get(var.index()).copied()
    }

    /// Which rule `constraint` encodes.
    pub fn constraint_key(&self, constraint: ConstraintId) -> Option<ConstraintKey> {
        self.constraint_keys.get(constraint.index()).copied()
    }

    /// The model in LP format, variables named like `x_1_2_3` and `adj_1_2_3` by padded row, padded column and label.
    pub fn to_lp(&self) -> String {
        write_lp(
            &self.model,
            |var| self.var_key(var).map_or_else(|| format!("v{}", var.index()), |key| key.to_string()),
            |constraint| self.constraint_key(constraint).map_or_else(|| format!("c{}", constraint.index()), |key| key.to_string()),
        )
    }

    /// Hand the model to `solver` and decode its assignment into a labeled grid.
    ///
    /// Returns `Ok(None)` when the solver finds no assignment; see [`Board::solve_with`](crate::Board::solve_with).
    pub fn solve(&self, solver: &impl Solver) -> Result<Option<Solved>, SolveError> {
        let solution = solver.solve(&self.model)?;
        match solution.status {
            Status::Optimal => info!("optimal solution cost {} found", solution.objective_value.unwrap_or_default()),
            Status::Feasible => info!(
                "sol.cost {} found, best possible: {}",
                solution.objective_value.unwrap_or_default(),
                solution.objective_bound
            ),
            Status::NoSolutionFound => {
                info!("no feasible solution found, bound is: {}", solution.objective_bound);
                return Ok(None);
            }
        }

        let board = decode(self, &solution)?;
        Ok(Some(Solved {
            board,
            status: solution.status,
            objective_value: solution.objective_value.unwrap_or_default(),
            objective_bound: solution.objective_bound,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZero;

    use crate::board::Board;
    use crate::formulation::{ConstraintKey, NumberlinkModel, VarKey};
    use crate::location::Location;
    use crate::model::{Comparison, Sense, VarKind};

    fn one() -> NonZero<u32> {
        NonZero::new(1).unwrap()
    }

    #[test]
    fn sizes() {
        // 1 x 2 board, one label: 3 x 4 padded cells, 2 interior
        let board = Board::from_rows(vec![vec![1, 1]]).unwrap();
        let model = NumberlinkModel::build(&board.pad(), Sense::Minimize);
        assert_eq!(model.dims(), (1, 2));
        assert_eq!(model.label_count(), 1);

        let variables = model.model().variables();
        assert_eq!(variables.iter().filter(|kind| **kind == VarKind::Binary).count(), 12);
        assert_eq!(variables.iter().filter(|kind| **kind == VarKind::Integer { lower: 0, upper: 4 }).count(), 2);

        // 10 sentinels; per interior cell: count, single, terminus, exit
        assert_eq!(model.model().constraints().len(), 10 + 2 * 4);
        assert_eq!(model.model().objective().terms().len(), 2);
    }

    #[test]
    fn keys_address_variables() {
        let board = Board::from_rows(vec![vec![1, 0, 1]]).unwrap();
        let model = NumberlinkModel::build(&board.pad(), Sense::Maximize);

        let x = model.occupancy(Location(0, 1), one()).unwrap();
        assert_eq!(model.var_key(x), Some(VarKey::Occupancy { location: Location(1, 2), label: one() }));
        let adj = model.neighbor_count(Location(0, 1), one()).unwrap();
        assert_eq!(model.var_key(adj), Some(VarKey::NeighborCount { location: Location(1, 2), label: one() }));

        assert_eq!(model.occupancy(Location(0, 3), one()), None);
        assert_eq!(model.occupancy(Location(0, 0), NonZero::new(2).unwrap()), None);
    }

    #[test]
    fn path_cells_get_two_sided_degree() {
        let board = Board::from_rows(vec![vec![1, 0, 1]]).unwrap();
        let model = NumberlinkModel::build(&board.pad(), Sense::Minimize);

        let middle = Location(1, 2);
        let rules = model.model().constraints().iter().enumerate()
            .filter_map(|(index, constraint)| {
                let key = model.constraint_key(crate::model::ConstraintId(index))?;
                Some((key, constraint))
            })
            .filter(|(key, _)| matches!(key,
                ConstraintKey::PathEntered { location, .. } | ConstraintKey::PathNotBranched { location, .. } if *location == middle))
            .collect::<Vec<_>>();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|(_, constraint)| constraint.comparison() == Comparison::Le));
        assert_eq!(rules[0].1.rhs(), 0);
        assert_eq!(rules[1].1.rhs(), 4);

        // no degree rule on endpoints
        assert!(model.model().constraints().iter().enumerate().all(|(index, _)| !matches!(
            model.constraint_key(crate::model::ConstraintId(index)),
            Some(ConstraintKey::PathEntered { location: Location(1, 1), .. })
        )));
    }

    #[test]
    fn lp_names_come_from_keys() {
        let board = Board::from_rows(vec![vec![0]]).unwrap();
        let model = NumberlinkModel::build(&board.pad(), Sense::Minimize);
        assert_eq!(model.to_lp(), "Minimize
 obj: 0
Subject To
Bounds
Generals
Binary
End
");

        let board = Board::from_rows(vec![vec![1, 1]]).unwrap();
        let lp = NumberlinkModel::build(&board.pad(), Sense::Minimize).to_lp();
        assert!(lp.contains(" obj: +1 x_1_1_1 +1 x_1_2_1\n"));
        assert!(lp.contains(" sentinel_0_0_1: +1 x_0_0_1 = +0\n"));
        assert!(lp.contains(" exit_1_2_1: +1 adj_1_2_1 = +1\n"));
        assert!(lp.contains(" 0 <= adj_1_1_1 <= 4\n"));
    }
}
