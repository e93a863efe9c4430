//! Box-drawing diagrams of labeled boards.
//!
//! Every cell becomes a 3 × 5 tile:
//!
//! ```text
//! ┼─t─┼
//! l c r
//! ┼─b─┼
//! ```
//!
//! where the walls `t`, `b`, `l`, `r` turn heavy wherever the path runs through them and `c` shows the path's shape in the cell.
//! Tiles sharing an edge are overlapped so the diagram of an `I × J` board is `2I + 1` lines of `4J + 1` glyphs.

use itertools::Itertools;
use ndarray::{s, Array2, Axis};

use crate::board::Board;
use crate::label::glyph;
use crate::location::Location;
use crate::shape::SquareStep;

const TILE_ROWS: usize = 3;
const TILE_COLS: usize = 5;

type Tile = [[char; TILE_COLS]; TILE_ROWS];

/// Whether the path through `location` continues into the neighbour in `direction`.
///
/// Unused cells never connect, and neither does anything past the edge of the board.
fn connects(board: &Board, location: Location, direction: SquareStep) -> bool {
    let Some(label) = board.get(location).filter(|label| *label > 0) else {
        return false;
    };

    direction.attempt_within(location, board.dims())
        .and_then(|neighbor| board.get(neighbor))
        .is_some_and(|other| other == label)
}

fn center(label: char, [up, down, left, right]: [bool; 4]) -> char {
    match (up, down, left, right) {
        (false, false, false, false) => ' ',
        (true, true, _, _) => '┃',
        (true, _, true, _) => '┛',
        (true, _, _, true) => '┗',
        (_, _, true, true) => '━',
        (_, true, true, _) => '┓',
        (_, true, _, true) => '┏',
        _ => label,
    }
}

fn tile(board: &Board, location: Location) -> Tile {
    let [up, down, left, right] = [SquareStep::Up, SquareStep::Down, SquareStep::Left, SquareStep::Right]
        .map(|direction| connects(board, location, direction));
    let label = board.get(location).map_or(' ', glyph);

    let vertical = |open: bool| if open { '┃' } else { '─' };
    let side = |open: bool| if open { '━' } else { '│' };
    let inner = |open: bool| if open { '━' } else { ' ' };

    let mut tile = [
        ['┼', '─', vertical(up), '─', '┼'],
        [side(left), inner(left), center(label, [up, down, left, right]), inner(right), side(right)],
        ['┼', '─', vertical(down), '─', '┼'],
    ];

    let (rows, cols) = board.dims();
    let Location(row, col) = location;

    if row == 0 {
        tile[0] = ['┳', '━', '━', '━', '┳'];
    }
    if row + 1 == rows {
        tile[2] = ['┻', '━', '━', '━', '┻'];
    }
    if col == 0 {
        [tile[0][0], tile[1][0], tile[2][0]] = ['┣', '┃', '┣'];
    }
    if col + 1 == cols {
        [tile[0][4], tile[1][4], tile[2][4]] = ['┫', '┃', '┫'];
    }

    // a 1-wide or 1-tall board has a cell on two corners at once
    if row == 0 && col == 0 {
        tile[0][0] = '┏';
    }
    if row == 0 && col + 1 == cols {
        tile[0][4] = '┓';
    }
    if row + 1 == rows && col == 0 {
        tile[2][0] = '┗';
    }
    if row + 1 == rows && col + 1 == cols {
        tile[2][4] = '┛';
    }

    tile
}

/// Draw `board` as a diagram of its paths, one line per text row joined by `\n` with no trailing newline.
///
/// Labels 1 through 35 appear as single base-36 glyphs at the ends of their paths; larger labels appear as `?`.
pub fn render(board: &Board) -> String {
    let (rows, cols) = board.dims();
    let mut canvas = Array2::from_elem((rows * TILE_ROWS, cols * TILE_COLS), ' ');

    for (row, col) in (0..rows).cartesian_product(0..cols) {
        let tile = tile(board, Location(row, col));
        let mut window = canvas.slice_mut(s![
            row * TILE_ROWS..(row + 1) * TILE_ROWS,
            col * TILE_COLS..(col + 1) * TILE_COLS
        ]);
        for ((r, c), slot) in window.indexed_iter_mut() {
            *slot = tile[r][c];
        }
    }

    // neighbouring tiles repeat the border between them; keep the earlier copy
    let keep_rows = (0..rows * TILE_ROWS).filter(|r| *r == 0 || r % TILE_ROWS != 0).collect_vec();
    let keep_cols = (0..cols * TILE_COLS).filter(|c| *c == 0 || c % TILE_COLS != 0).collect_vec();

    let diagram = canvas.select(Axis(0), &keep_rows).select(Axis(1), &keep_cols);
    diagram.rows()
        .into_iter()
        .map(|line| line.iter().collect::<String>())
        .join("\n")
}
