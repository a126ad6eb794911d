/// Level grid: the owned cell buffer of the level currently in play.
///
/// Cells are stored row-major in one contiguous `Vec<Cell>` with explicit
/// dimensions. `cells.len() == rows * columns` at all times; an unloaded
/// level is `0 × 0` with an empty buffer.
///
/// Indexed access (`cell` / `set_cell`) does not bounds-check beyond a
/// `debug_assert!`. Callers guard with `is_inside` or go through the
/// collision helpers, which only touch in-bounds cells.

use super::cell::Cell;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Level {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl Level {
    /// Empty, unloaded level.
    pub fn new() -> Self {
        Level::default()
    }

    /// Build from rows of cells. Short rows are padded with Air.
    /// Returns None for a degenerate (zero-area) grid.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Self> {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        if rows.is_empty() || columns == 0 {
            return None;
        }
        let mut cells = Vec::with_capacity(rows.len() * columns);
        for row in &rows {
            cells.extend_from_slice(row);
            cells.extend(std::iter::repeat(Cell::Air).take(columns - row.len()));
        }
        Some(Level { rows: rows.len(), columns, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_loaded(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Release the grid. Safe to call on an already empty level.
    pub fn unload(&mut self) {
        self.cells = Vec::new();
        self.rows = 0;
        self.columns = 0;
    }

    /// Half-open bounds check: `[0, rows) × [0, columns)`.
    pub fn is_inside(&self, row: i64, column: i64) -> bool {
        row >= 0 && column >= 0 && (row as usize) < self.rows && (column as usize) < self.columns
    }

    #[inline]
    pub fn cell(&self, row: usize, column: usize) -> Cell {
        debug_assert!(row < self.rows && column < self.columns, "cell ({row}, {column}) out of bounds");
        self.cells[row * self.columns + column]
    }

    #[inline]
    fn cell_mut(&mut self, row: usize, column: usize) -> &mut Cell {
        debug_assert!(row < self.rows && column < self.columns, "cell ({row}, {column}) out of bounds");
        &mut self.cells[row * self.columns + column]
    }

    #[inline]
    pub fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        *self.cell_mut(row, column) = cell;
    }

    /// Number of cells of the given type.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Replace every `marker` cell with Air, returning the (row, column)
    /// of each in row-major order.
    pub fn take_markers(&mut self, marker: Cell) -> Vec<(usize, usize)> {
        let columns = self.columns;
        let mut found = vec![];
        for (i, cell) in self.cells.iter_mut().enumerate() {
            if *cell == marker {
                *cell = Cell::Air;
                found.push((i / columns, i % columns));
            }
        }
        found
    }

    /// Iterate rows as slices.
    pub fn row_slices(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks(0) panics, so an unloaded level yields nothing
        self.cells.chunks(self.columns.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_from(rows: &[&str]) -> Level {
        let rows = rows
            .iter()
            .map(|r| r.chars().map(|c| Cell::from_glyph(c).unwrap()).collect())
            .collect();
        Level::from_rows(rows).unwrap()
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let l = level_from(&["###", "#"]);
        assert_eq!(l.rows(), 2);
        assert_eq!(l.columns(), 3);
        assert_eq!(l.count(Cell::Wall) + l.count(Cell::Air), 6);
        assert_eq!(l.cell(1, 0), Cell::Wall);
        assert_eq!(l.cell(1, 2), Cell::Air);
    }

    #[test]
    fn from_rows_rejects_degenerate() {
        assert!(Level::from_rows(vec![]).is_none());
        assert!(Level::from_rows(vec![vec![], vec![]]).is_none());
    }

    #[test]
    fn is_inside_half_open() {
        let l = level_from(&["---", "---"]);
        assert!(l.is_inside(0, 0));
        assert!(l.is_inside(1, 2));
        assert!(!l.is_inside(2, 0));
        assert!(!l.is_inside(0, 3));
        assert!(!l.is_inside(-1, 0));
        assert!(!l.is_inside(0, -1));
    }

    #[test]
    fn unload_is_idempotent() {
        let mut l = level_from(&["#"]);
        l.unload();
        assert!(!l.is_loaded());
        assert_eq!((l.rows(), l.columns()), (0, 0));
        l.unload();
        assert!(!l.is_loaded());
        assert_eq!(l.row_slices().count(), 0);
    }

    #[test]
    fn set_and_get_cell() {
        let mut l = level_from(&["---", "---"]);
        l.set_cell(1, 2, Cell::Coin);
        assert_eq!(l.cell(1, 2), Cell::Coin);
        assert_eq!(l.count(Cell::Coin), 1);
    }

    #[test]
    fn take_markers_consumes_in_row_major_order() {
        let mut l = level_from(&["-&-", "&@&"]);
        let enemies = l.take_markers(Cell::Enemy);
        assert_eq!(enemies, vec![(0, 1), (1, 0), (1, 2)]);
        assert_eq!(l.count(Cell::Enemy), 0);
        assert_eq!(l.cell(1, 1), Cell::Player);
        assert_eq!(l.take_markers(Cell::Player), vec![(1, 1)]);
        assert_eq!(l.count(Cell::Air), 6);
    }
}
