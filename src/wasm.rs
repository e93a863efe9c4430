//! JavaScript entry points. Boards cross the boundary as flat row-major `u32` arrays.

use js_sys::Error;
use ndarray::Array2;
use wasm_bindgen::prelude::*;

use crate::board::{Board, SolveOptions};
use crate::model::Sense;
use crate::render::render;

fn board(cells: &[u32], rows: usize, cols: usize) -> Result<Board, JsValue> {
    let cells = Array2::from_shape_vec((rows, cols), cells.to_vec())
        .map_err(|err| Error::new(&format!("{} cells do not form a {}x{} board: {}", cells.len(), rows, cols, err)))?;

    Board::from_array(cells).map_err(|err| Error::new(&err.to_string()).into())
}

/// Solve the puzzle, returning its diagram, or `undefined` if it has no solution.
#[wasm_bindgen(js_name = solveGrid)]
pub fn solve_grid(cells: &[u32], rows: usize, cols: usize, maximize: bool) -> Result<Option<String>, JsValue> {
    let options = SolveOptions::with_sense(if maximize { Sense::Maximize } else { Sense::Minimize });
    let solved = board(cells, rows, cols)?
        .solve(&options)
        .map_err(|err| Error::new(&err.to_string()))?;

    Ok(solved.map(|solved| render(&solved.board)))
}

/// Draw an already labeled grid.
#[wasm_bindgen(js_name = renderGrid)]
pub fn render_grid(cells: &[u32], rows: usize, cols: usize) -> Result<String, JsValue> {
    Ok(render(&board(cells, rows, cols)?))
}
