//! Grid model shared by every other component.
//!
//! A grid is a rectangular block of cell codes as produced by the problem
//! generator. It is validated once on construction and never mutated after.

use serde::{Deserialize, Serialize};

/// Meaning of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// 0: walkable
    Open,
    /// 1: blocked
    Wall,
    /// 2: key or target, depending on the puzzle archetype
    Special,
    /// 3: walkable with extra cost
    Weighted,
}

impl Cell {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Cell::Open),
            1 => Some(Cell::Wall),
            2 => Some(Cell::Special),
            3 => Some(Cell::Weighted),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Cell::Open => 0,
            Cell::Wall => 1,
            Cell::Special => 2,
            Cell::Weighted => 3,
        }
    }
}

/// A (row, column) coordinate, 0-indexed, row-major.
///
/// Serialized as a two element array `[row, col]`, the wire shape used by
/// problem files and test case outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    #[inline]
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self { row, col }
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.row, pos.col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Error building a [`Grid`] from raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// No rows, or rows with no columns
    Empty,
    /// A row whose length differs from the first row
    Ragged { row: usize, expected: usize, found: usize },
    /// A cell code outside 0..=3
    UnknownCell { row: usize, col: usize, code: u8 },
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::Empty => write!(f, "grid has no cells"),
            GridError::Ragged { row, expected, found } => write!(
                f,
                "grid is not rectangular: row {} has {} cells, expected {}",
                row, found, expected
            ),
            GridError::UnknownCell { row, col, code } => {
                write!(f, "unknown cell code {} at ({}, {})", code, row, col)
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Rectangular puzzle grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from raw cell codes, rejecting ragged rows and unknown codes.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self, GridError> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if cols == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Ragged { row: r, expected: cols, found: row.len() });
            }
            for (c, &code) in row.iter().enumerate() {
                let cell = Cell::from_code(code)
                    .ok_or(GridError::UnknownCell { row: r, col: c, code })?;
                cells.push(cell);
            }
        }

        Ok(Self { rows: rows.len(), cols, cells })
    }

    /// Grid of the given size with every cell open.
    pub fn open(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![Cell::Open; rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Whether `pos` lies inside the grid.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols
    }

    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if !self.contains(pos) {
            return None;
        }
        Some(self.cells[pos.row as usize * self.cols + pos.col as usize])
    }

    /// Iterate over rows as cell slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.cols)
    }

    /// Raw cell codes, row by row.
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.iter_rows()
            .map(|row| row.iter().map(|c| c.code()).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl From<Grid> for Vec<Vec<u8>> {
    fn from(grid: Grid) -> Self {
        grid.to_codes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rectangular() {
        let grid = Grid::from_rows(vec![vec![0, 1, 0], vec![2, 3, 0]]).unwrap();
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.cell(Position::new(0, 1)), Some(Cell::Wall));
        assert_eq!(grid.cell(Position::new(1, 0)), Some(Cell::Special));
        assert_eq!(grid.cell(Position::new(1, 1)), Some(Cell::Weighted));
    }

    #[test]
    fn test_ragged_rejected() {
        let err = Grid::from_rows(vec![vec![0, 0], vec![0]]).unwrap_err();
        assert_eq!(err, GridError::Ragged { row: 1, expected: 2, found: 1 });
    }

    #[test]
    fn test_unknown_cell_rejected() {
        let err = Grid::from_rows(vec![vec![0, 7]]).unwrap_err();
        assert_eq!(err, GridError::UnknownCell { row: 0, col: 1, code: 7 });
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(Grid::from_rows(vec![]).unwrap_err(), GridError::Empty);
        assert_eq!(Grid::from_rows(vec![vec![]]).unwrap_err(), GridError::Empty);
    }

    #[test]
    fn test_contains_bounds() {
        let grid = Grid::open(2, 3);
        assert!(grid.contains(Position::new(1, 2)));
        assert!(!grid.contains(Position::new(2, 0)));
        assert!(!grid.contains(Position::new(0, 3)));
        assert!(!grid.contains(Position::new(-1, 0)));
        assert_eq!(grid.cell(Position::new(5, 5)), None);
    }

    #[test]
    fn test_serde_shape() {
        let grid: Grid = serde_json::from_str("[[0,1],[3,2]]").unwrap();
        assert_eq!(grid.cell(Position::new(1, 0)), Some(Cell::Weighted));
        assert_eq!(serde_json::to_string(&grid).unwrap(), "[[0,1],[3,2]]");

        assert!(serde_json::from_str::<Grid>("[[0,1],[0]]").is_err());
    }

    #[test]
    fn test_position_wire_format() {
        let pos: Position = serde_json::from_str("[4, 7]").unwrap();
        assert_eq!(pos, Position::new(4, 7));
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[4,7]");
        assert_eq!(pos.to_string(), "(4, 7)");
    }
}
