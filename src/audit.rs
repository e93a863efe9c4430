//! Independent checks of a labeled grid against the puzzle it claims to solve.
//!
//! The model only bounds the number of same-label neighbours of each cell, which rules out branches and dead ends but not closed loops detached from any endpoint.
//! Minimizing never keeps such a loop; maximizing happily does. [`audit`] reports those alongside everything else a valid solution must satisfy.

use std::collections::HashSet;
use std::num::NonZero;

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use petgraph::visit::Bfs;
use thiserror::Error;
use unordered_pair::UnorderedPair;

use crate::board::Board;
use crate::label::Label;
use crate::location::{Coord, Location};
use crate::shape::SquareStep;

/// One way a labeled grid fails to solve a puzzle.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Violation {
    /// The grids differ in size, so nothing else was checked.
    #[error("expected a {}x{} grid, found {}x{}", .expected.0, .expected.1, .found.0, .found.1)]
    Shape {
        /// `(rows, columns)` of the puzzle.
        expected: (Coord, Coord),
        /// `(rows, columns)` of the grid checked.
        found: (Coord, Coord),
    },
    /// A given endpoint was overwritten.
    #[error("endpoint {expected} at {location} became {found}")]
    EndpointChanged {
        /// Where the endpoint is.
        location: Location,
        /// The endpoint's label in the puzzle.
        expected: Label,
        /// What the grid holds there instead.
        found: Label,
    },
    /// An endpoint is not left by exactly one step.
    #[error("endpoint of label {label} at {location} has {degree} neighbours on its path")]
    EndpointDegree {
        /// Where the endpoint is.
        location: Location,
        /// Its label.
        label: Label,
        /// Number of orthogonal neighbours carrying the same label.
        degree: usize,
    },
    /// A cell in the middle of a path does not continue in exactly two directions.
    #[error("cell {location} on path {label} has {degree} neighbours on its path")]
    PathDegree {
        /// The offending cell.
        location: Location,
        /// Its label.
        label: Label,
        /// Number of orthogonal neighbours carrying the same label.
        degree: usize,
    },
    /// The two endpoints of a label are not joined.
    #[error("endpoints {:?} of label {label} are not connected", .endpoints)]
    Disconnected {
        /// The label whose path is broken.
        label: Label,
        /// Its two endpoints.
        endpoints: UnorderedPair<Location>,
    },
    /// Cells carry a label without lying on the path between its endpoints.
    #[error("label {label} covers cells {} off its path", .locations.iter().join(", "))]
    Stray {
        /// The label carried.
        label: Label,
        /// Cells carrying it off its path, row-major.
        locations: Vec<Location>,
    },
}

/// Links between orthogonally adjacent cells carrying the same positive label.
fn links(board: &Board) -> UnGraphMap<Location, Label> {
    let (rows, cols) = board.cells().dim();
    let mut graph = UnGraphMap::with_capacity(board.cells().len(), 2 * board.cells().len());

    for ((row, col), label) in board.cells().indexed_iter() {
        if *label == 0 {
            continue;
        }
        let location = Location(row, col);
        graph.add_node(location);

        // down and right only; each link is seen from its upper or left end
        for step in [SquareStep::Down, SquareStep::Right] {
            if let Some(neighbor) = step.attempt_within(location, (rows, cols)) {
                if board.get(neighbor) == Some(*label) {
                    graph.add_edge(location, neighbor, *label);
                }
            }
        }
    }

    graph
}

/// Check `solved` against `puzzle`, returning every violation found in row-major order per kind.
///
/// An empty result means each label's endpoints are preserved and joined by a simple path, and no cell carries a label off that path.
/// Labels occurring other than twice in `puzzle` are not checked for connectivity; see [`Board::pairing_issues`].
pub fn audit(puzzle: &Board, solved: &Board) -> Vec<Violation> {
    if puzzle.dims() != solved.dims() {
        return vec![Violation::Shape { expected: puzzle.dims(), found: solved.dims() }];
    }

    let graph = links(solved);
    let degree = |location: Location| graph.neighbors(location).count();
    let mut violations = Vec::new();

    for (index, label) in solved.cells().indexed_iter() {
        let location = Location::from(index);
        let given = puzzle.get(location).unwrap_or_default();

        if given != 0 {
            if given != *label {
                violations.push(Violation::EndpointChanged { location, expected: given, found: *label });
            } else if degree(location) != 1 {
                violations.push(Violation::EndpointDegree { location, label: *label, degree: degree(location) });
            }
        } else if *label != 0 && degree(location) != 2 {
            violations.push(Violation::PathDegree { location, label: *label, degree: degree(location) });
        }
    }

    let endpoints = puzzle.cells().indexed_iter()
        .filter(|(_, label)| **label != 0)
        .map(|(index, label)| (*label, Location::from(index)))
        .into_group_map();

    for label in (1..=solved.max_label()).filter_map(NonZero::new).map(NonZero::get) {
        let mut on_path = HashSet::new();
        if let Some(&[start, end]) = endpoints.get(&label).map(Vec::as_slice) {
            if graph.contains_node(start) {
                let mut bfs = Bfs::new(&graph, start);
                while let Some(reached) = bfs.next(&graph) {
                    on_path.insert(reached);
                }
            }
            if !on_path.contains(&end) {
                violations.push(Violation::Disconnected { label, endpoints: UnorderedPair::from((start, end)) });
            }
        }

        let stray = solved.cells().indexed_iter()
            .filter(|(_, value)| **value == label)
            .map(|(index, _)| Location::from(index))
            .filter(|location| !on_path.contains(location))
            .collect_vec();
        if !stray.is_empty() {
            violations.push(Violation::Stray { label, locations: stray });
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use unordered_pair::UnorderedPair;

    use crate::audit::{audit, Violation};
    use crate::board::Board;
    use crate::location::Location;

    #[test]
    fn accepts_valid_solution() {
        let puzzle: Board = "1 0 1\n2 0 2\n".parse().unwrap();
        let solved: Board = "1 1 1\n2 2 2\n".parse().unwrap();
        assert_eq!(audit(&puzzle, &solved), vec![]);
    }

    #[test]
    fn reports_broken_paths() {
        let puzzle: Board = "1 0 1\n2 0 2\n".parse().unwrap();
        let solved: Board = "1 1 1\n2 0 2\n".parse().unwrap();

        let violations = audit(&puzzle, &solved);
        assert_eq!(violations, vec![
            Violation::EndpointDegree { location: Location(1, 0), label: 2, degree: 0 },
            Violation::EndpointDegree { location: Location(1, 2), label: 2, degree: 0 },
            Violation::Disconnected { label: 2, endpoints: UnorderedPair::from((Location(1, 0), Location(1, 2))) },
            Violation::Stray { label: 2, locations: vec![Location(1, 2)] },
        ]);
    }

    #[test]
    fn reports_detached_loops() {
        let puzzle: Board = "1 0 0 1\n0 0 0 0\n0 0 0 0\n0 0 0 0\n".parse().unwrap();
        let solved: Board = "1 1 1 1\n0 0 0 0\n1 1 0 0\n1 1 0 0\n".parse().unwrap();

        assert_eq!(audit(&puzzle, &solved), vec![Violation::Stray {
            label: 1,
            locations: vec![Location(2, 0), Location(2, 1), Location(3, 0), Location(3, 1)],
        }]);
    }

    #[test]
    fn reports_overwritten_endpoints_and_shape() {
        let puzzle: Board = "1 1\n".parse().unwrap();
        let solved: Board = "2 2\n".parse().unwrap();
        assert!(audit(&puzzle, &solved).contains(&Violation::EndpointChanged { location: Location(0, 0), expected: 1, found: 2 }));

        let taller: Board = "1 1\n0 0\n".parse().unwrap();
        assert_eq!(audit(&puzzle, &taller), vec![Violation::Shape { expected: (1, 2), found: (2, 2) }]);
    }
}
