//! Cursor movement and pointer mapping for the board.

use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use strictly_chess::Square;

/// Terminal columns per board square.
pub const CELL_WIDTH: u16 = 3;

/// Moves cursor based on arrow keys, stopping at the board edge.
///
/// White is at the bottom, so Up increases the rank.
pub fn move_cursor(cursor: Square, key: KeyCode) -> Square {
    let step = match key {
        KeyCode::Up => (0, 1),
        KeyCode::Down => (0, -1),
        KeyCode::Left => (-1, 0),
        KeyCode::Right => (1, 0),
        _ => return cursor,
    };
    cursor.offset(step.0, step.1).unwrap_or(cursor)
}

/// Maps a terminal cell to the square drawn there.
///
/// `grid` is the area holding the 8x8 cells, rank 8 on its top row.
pub fn square_at(grid: Rect, column: u16, row: u16) -> Option<Square> {
    if column < grid.x || row < grid.y {
        return None;
    }
    let file = (column - grid.x) / CELL_WIDTH;
    let from_top = row - grid.y;
    if file >= 8 || from_top >= 8 {
        return None;
    }
    Square::from_coords(file as u8, 7 - from_top as u8)
}
