//! Pure board evaluation.

use super::{
    constants::WINNING_RUN,
    entities::{Board, Color, Coord},
};

/// Horizontal, vertical, and the two diagonals.
const AXES: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Count contiguous `color` stones from `at` (exclusive) along `(dx, dy)`.
fn count_direction(board: &Board, at: Coord, color: Color, dx: isize, dy: isize) -> usize {
    let mut count = 0;
    let mut distance = 1;
    while let Some(next) = at.offset(dx, dy, distance) {
        if board.get(next) != Some(color) {
            break;
        }
        count += 1;
        distance += 1;
    }
    count
}

/// Length of the run through `at` along one axis, counting `at` itself.
pub fn run_length(board: &Board, at: Coord, color: Color, dx: isize, dy: isize) -> usize {
    1 + count_direction(board, at, color, dx, dy) + count_direction(board, at, color, -dx, -dy)
}

/// Whether the stone of `color` just placed at `at` completes exactly five
/// in a row on some axis. Runs of six or more (overlines) do not win.
///
/// The board is expected to already contain the stone at `at`; the cell
/// itself is counted regardless of its contents.
pub fn is_winning_move(board: &Board, at: Coord, color: Color) -> bool {
    AXES.iter()
        .any(|&(dx, dy)| run_length(board, at, color, dx, dy) == WINNING_RUN)
}
