//! Blast propagation on the board.

use std::collections::BTreeSet;

use crate::types::{Direction, Position};

/// Cells reached by a bomb exploding at `center`.
///
/// The center always burns. A bomb lying on a block goes no further.
/// Otherwise each of the four arms walks up to `radius` cells, stopping
/// before the board edge and stopping after (inclusive of) the first block.
pub fn explosion_cells(
    center: Position,
    radius: u16,
    size_x: u16,
    size_y: u16,
    blocks: &BTreeSet<Position>,
) -> BTreeSet<Position> {
    let mut cells = BTreeSet::new();
    cells.insert(center);

    if blocks.contains(&center) {
        return cells;
    }

    for direction in Direction::ALL {
        let mut cell = center;
        for _ in 0..radius {
            match cell.step(direction, size_x, size_y) {
                Some(next) => cell = next,
                None => break,
            }
            cells.insert(cell);
            if blocks.contains(&cell) {
                break;
            }
        }
    }

    cells
}
