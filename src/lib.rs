#![warn(missing_docs)]

//! # `numberlink-ilp`
//!
//! A solver for [Numberlink](https://en.wikipedia.org/wiki/Numberlink) puzzles posed as integer linear programs, with a box-drawing renderer for the result.
//! Begin by constructing a [`Board`], either from rows of labels, by parsing text, or with a [`BoardBuilder`](builder::BoardBuilder).
//! Call [`solve()`](Board::solve) to get the labeled grid of the optimal solution, then [`render()`](render::render) it.
//!
//! ```text
//! ┏━━━┳━━━┓
//! ┃ 1━━━1 ┃
//! ┗━━━┻━━━┛
//! ```
//!
//! # Internals
//! The puzzle is surrounded by a ring of sentinel cells so every real cell has four neighbours.
//! For every cell and label, a binary variable says whether the cell lies on that label's path, and an integer variable counts how many of its neighbours do.
//! Endpoints must have exactly one such neighbour, other path cells exactly two; see [`formulation`] for the full list.
//! The total number of covered cells is then minimized or maximized.
//!
//! The model is handed to any [`Solver`](solver::Solver).
//! The bundled [`SatSolver`](solver::SatSolver) reduces it to Boolean satisfiability, since every domain is tiny, and tightens the objective until the formula becomes unsatisfiable.
//! The assignment is then read back into a labeled grid.
//!
//! Counting neighbours forbids branches and dead ends but not closed loops away from every endpoint; [`audit::audit`] finds those.

pub use board::{Board, SolveError, SolveOptions, Solved};
pub use location::Location;
pub use model::Sense;
pub use render::render;

pub mod audit;
pub mod board;
pub mod builder;
pub mod cell;
pub mod decode;
pub mod formulation;
pub mod label;
pub(crate) mod location;
pub(crate) mod logic;
pub mod lp;
pub mod model;
pub mod render;
pub mod shape;
pub mod solver;
#[cfg(feature = "wasm")]
pub mod wasm;
