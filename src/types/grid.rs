//! Row-major two-dimensional grid used for distance and temperature images

use serde::{Deserialize, Serialize};

/// Row-major grid of sensor cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Build a grid from row-major cells.
    ///
    /// Returns `None` when `cells.len() != rows * cols`.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<T>) -> Option<Self> {
        (cells.len() == rows * cols).then_some(Self { rows, cols, cells })
    }

    /// Grid filled with a single value.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self { rows, cols, cells: vec![value; rows * cols] }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.rows && col < self.cols { Some(self.cells[row * self.cols + col]) } else { None }
    }

    /// Row-major cell slice.
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Iterate rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.cols.max(1))
    }

    /// New grid of `rows x cols` where each cell is pulled from `self` by `source(row, col)`.
    pub(crate) fn remap(
        &self,
        rows: usize,
        cols: usize,
        source: impl Fn(usize, usize) -> (usize, usize),
    ) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let (sr, sc) = source(r, c);
                cells.push(self.cells[sr * self.cols + sc]);
            }
        }
        Self { rows, cols, cells }
    }
}

impl<T: Copy + PartialOrd> Grid<T> {
    /// Smallest and largest cell values, if any.
    pub fn min_max(&self) -> Option<(T, T)> {
        let mut iter = self.cells.iter().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| {
            (if v < lo { v } else { lo }, if v > hi { v } else { hi })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cells_checks_dimensions() {
        assert!(Grid::from_cells(2, 3, vec![0u8; 6]).is_some());
        assert!(Grid::from_cells(2, 3, vec![0u8; 5]).is_none());
    }

    #[test]
    fn row_major_indexing() {
        let grid = Grid::from_cells(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(grid.get(0, 2), Some(3));
        assert_eq!(grid.get(1, 0), Some(4));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.iter_rows().nth(1), Some(&[4, 5, 6][..]));
        assert_eq!(grid.min_max(), Some((1, 6)));
    }
}
