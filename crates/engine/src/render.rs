//! Cell classification for drawing a grid with a playback overlay.
//!
//! Front ends only decide how a [`CellShade`] looks; which shade wins for a
//! cell is decided here.

use std::collections::HashSet;

use crate::grid::{Cell, Grid, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellShade {
    Start,
    End,
    Path,
    Visited,
    Wall,
    Special,
    Weighted,
    Open,
}

impl CellShade {
    /// Character used by the plain-text renderer.
    pub fn glyph(self) -> char {
        match self {
            CellShade::Start => 'S',
            CellShade::End => 'E',
            CellShade::Path => '*',
            CellShade::Visited => '.',
            CellShade::Wall => '#',
            CellShade::Special => 'K',
            CellShade::Weighted => '~',
            CellShade::Open => ' ',
        }
    }
}

impl From<Cell> for CellShade {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Open => CellShade::Open,
            Cell::Wall => CellShade::Wall,
            Cell::Special => CellShade::Special,
            Cell::Weighted => CellShade::Weighted,
        }
    }
}

/// Shade every cell. Precedence: start, end, path, visited, cell code.
///
/// Positions outside the grid are ignored.
pub fn shade_grid(
    grid: &Grid,
    start: Position,
    end: Position,
    visited: &[Position],
    path: &[Position],
) -> Vec<Vec<CellShade>> {
    let visited: HashSet<Position> = visited.iter().copied().collect();
    let path: HashSet<Position> = path.iter().copied().collect();

    grid.iter_rows()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, &cell)| {
                    let pos = Position::new(r as i32, c as i32);
                    if pos == start {
                        CellShade::Start
                    } else if pos == end {
                        CellShade::End
                    } else if path.contains(&pos) {
                        CellShade::Path
                    } else if visited.contains(&pos) {
                        CellShade::Visited
                    } else {
                        CellShade::from(cell)
                    }
                })
                .collect()
        })
        .collect()
}

/// Character map of the grid, one line per row.
pub fn render_plain(
    grid: &Grid,
    start: Position,
    end: Position,
    visited: &[Position],
    path: &[Position],
) -> String {
    let mut out = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for row in shade_grid(grid, start, end, visited, path) {
        out.extend(row.into_iter().map(CellShade::glyph));
        out.push('\n');
    }
    out
}
