use std::fmt::{Display, Formatter};
use std::num::NonZero;
use std::str::FromStr;

use itertools::Itertools;
use ndarray::{s, Array2};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cell::WorkingCell;
use crate::decode::DecodeError;
use crate::formulation::NumberlinkModel;
use crate::label::Label;
use crate::location::{Coord, Location};
use crate::model::Sense;
use crate::solver::{SatSolver, Solver, SolverFailure, Status};

/// Reasons a [`Board`] could not be constructed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BoardError {
    /// A board needs at least one row and one column.
    #[error("a board needs at least one row and one column")]
    Empty,
    /// Row `row` has `found` cells where `expected` were needed.
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        /// Zero-based index of the short or long row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of this row.
        found: usize,
    },
    /// A token of textual input was not a non-negative integer.
    #[error("{token:?} on row {row} is not a cell value")]
    BadToken {
        /// Zero-based index of the row, counting only non-blank lines.
        row: usize,
        /// The token as written.
        token: String,
    },
}

/// A label occurring somewhere other than exactly twice.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairingIssue {
    /// The offending label.
    pub label: NonZero<Label>,
    /// Every place it occurs, row-major.
    pub locations: Vec<Location>,
}

impl Display for PairingIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "label {} occurs {} times ({})", self.label, self.locations.len(), self.locations.iter().join(", "))
    }
}

/// A rectangular grid of labels: the puzzle itself, or a solved grid.
///
/// In a puzzle, `0` is an empty cell and each positive label should appear exactly twice, marking the two ends of its path.
/// In a solved grid, every cell on a label's path carries that label and unused cells stay `0`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    pub(crate) cells: Array2<Label>,
}

impl Board {
    /// Construct from a non-empty rectangular array.
    pub fn from_array(cells: Array2<Label>) -> Result<Self, BoardError> {
        if cells.is_empty() {
            return Err(BoardError::Empty);
        }

        Ok(Self { cells })
    }

    /// Construct from rows, which must all have the same non-zero length.
    pub fn from_rows(rows: Vec<Vec<Label>>) -> Result<Self, BoardError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(BoardError::Empty);
        }
        if let Some((row, found)) = rows.iter().map(Vec::len).enumerate().find(|(_, len)| *len != expected) {
            return Err(BoardError::Ragged { row, expected, found });
        }

        let height = rows.len();
        let cells = Array2::from_shape_vec((height, expected), rows.into_iter().flatten().collect_vec())
            .map_err(|_| BoardError::Empty)?;
        Self::from_array(cells)
    }

    /// `(rows, columns)`.
    pub fn dims(&self) -> (Coord, Coord) {
        self.cells.dim()
    }

    /// The label at `location`, or [`None`] outside the board.
    pub fn get(&self, location: Location) -> Option<Label> {
        self.cells.get(location.as_index()).copied()
    }

    /// The largest label present, i.e. the number of labels the model must consider.
    pub fn max_label(&self) -> Label {
        self.cells.iter().copied().max().unwrap_or_default()
    }

    /// The underlying array.
    pub fn cells(&self) -> &Array2<Label> {
        &self.cells
    }

    /// Labels that do not occur exactly twice.
    pub fn pairing_issues(&self) -> Vec<PairingIssue> {
        self.cells.indexed_iter()
            .filter_map(|(index, value)| NonZero::new(*value).map(|label| (label, Location::from(index))))
            .into_group_map()
            .into_iter()
            .filter(|(_, locations)| locations.len() != 2)
            .map(|(label, locations)| PairingIssue { label, locations })
            .sorted_by_key(|issue| issue.label)
            .collect_vec()
    }

    /// Surround the board with a ring of [`WorkingCell::Sentinel`]s and classify every interior cell.
    pub fn pad(&self) -> WorkingBoard {
        let (rows, cols) = self.dims();
        let mut cells = Array2::from_elem((rows + 2, cols + 2), WorkingCell::Sentinel);
        cells.slice_mut(s![1..=rows, 1..=cols])
            .zip_mut_with(&self.cells, |cell, value| *cell = WorkingCell::from_label(*value));

        WorkingBoard { cells, max_label: self.max_label() }
    }

    /// Solve this board with the default [`SatSolver`].
    ///
    /// See [`Self::solve_with`].
    pub fn solve(&self, options: &SolveOptions) -> Result<Option<Solved>, SolveError> {
        self.solve_with(options, &SatSolver::default())
    }

    /// Solve this board, deferring the optimization to `solver`.
    ///
    /// Returns `Ok(None)` when the solver finds no assignment satisfying the model, which is how malformed or unsolvable puzzles usually surface.
    /// Returns [`SolveError::Inconsistent`] if the solver's assignment breaks the model's own invariants; that is a bug, not a property of the puzzle.
    pub fn solve_with(&self, options: &SolveOptions, solver: &impl Solver) -> Result<Option<Solved>, SolveError> {
        self.model(options)?.solve(solver)
    }

    /// Check this board and build its [`NumberlinkModel`], without solving it.
    ///
    /// Pairing problems are logged, or rejected if [`SolveOptions::strict_pairing`] is set.
    /// A largest label above the number of cells is always rejected with [`SolveError::TooManyLabels`], since the model holds one variable per cell and label.
    pub fn model(&self, options: &SolveOptions) -> Result<NumberlinkModel, SolveError> {
        let max_label = self.max_label();
        let cells = self.cells.len();
        if usize::try_from(max_label).map_or(true, |labels| labels > cells) {
            return Err(SolveError::TooManyLabels { max_label, cells });
        }

        let issues = self.pairing_issues();
        if !issues.is_empty() {
            if options.strict_pairing {
                return Err(SolveError::MalformedInput(issues));
            }
            issues.iter().for_each(|issue| warn!(%issue, "malformed endpoint pairing"));
        }

        let model = NumberlinkModel::build(&self.pad(), options.sense);
        debug!(
            variables = model.model().variables().len(),
            constraints = model.model().constraints().len(),
            labels = model.label_count(),
            "built model"
        );

        Ok(model)
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.rows() {
            writeln!(f, "{}", row.iter().join(" "))?;
        }

        Ok(())
    }
}

impl FromStr for Board {
    type Err = BoardError;

    /// Parse whitespace-separated integers, one board row per non-blank line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s.lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(row, line)| line.split_whitespace()
                .map(|token| token.parse::<Label>().map_err(|_| BoardError::BadToken { row, token: token.to_string() }))
                .collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(rows)
    }
}

/// A [`Board`] padded with one ring of sentinels, as consumed by [`NumberlinkModel::build`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkingBoard {
    pub(crate) cells: Array2<WorkingCell>,
    pub(crate) max_label: Label,
}

impl WorkingBoard {
    /// `(rows, columns)` including the sentinel ring.
    pub fn dims(&self) -> (Coord, Coord) {
        self.cells.dim()
    }

    /// The padded cells.
    pub fn cells(&self) -> &Array2<WorkingCell> {
        &self.cells
    }

    /// The largest label of the original board.
    pub fn max_label(&self) -> Label {
        self.max_label
    }
}

/// Caller choices for [`Board::solve`].
#[derive(Clone, Debug, Default)]
pub struct SolveOptions {
    /// Whether to minimize or maximize the number of cells on paths.
    pub sense: Sense,
    /// Reject boards whose labels do not each occur exactly twice, instead of letting the solver find them infeasible.
    pub strict_pairing: bool,
}

impl SolveOptions {
    /// Default options with the given sense.
    pub fn with_sense(sense: Sense) -> Self {
        Self { sense, ..Default::default() }
    }
}

/// A solved board together with what the solver reported.
#[derive(Clone, Debug)]
pub struct Solved {
    /// The labeled grid.
    pub board: Board,
    /// [`Status::Optimal`] or [`Status::Feasible`].
    pub status: Status,
    /// Number of cells on paths.
    pub objective_value: i64,
    /// Best value the solver could prove possible.
    pub objective_bound: i64,
}

/// Reasons solving may fail outright, as opposed to finding no solution.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Some label does not occur exactly twice and [`SolveOptions::strict_pairing`] was set.
    #[error("malformed endpoint pairing: {}", .0.iter().join("; "))]
    MalformedInput(Vec<PairingIssue>),
    /// The largest label exceeds the number of cells, so no puzzle with labels `1..=max_label` fits the board.
    #[error("label {max_label} on a board of only {cells} cells")]
    TooManyLabels {
        /// The largest label on the board.
        max_label: Label,
        /// Number of cells on the board.
        cells: usize,
    },
    /// The solver itself failed.
    #[error(transparent)]
    Solver(#[from] SolverFailure),
    /// The solver's assignment contradicts the model.
    #[error(transparent)]
    Inconsistent(#[from] DecodeError),
}
