//! Display orientation: clockwise rotation plus horizontal mirror
//!
//! Device-native coordinates are `(x, y)` with `x` the column and `y` the row of a
//! grid with `R` rows and `C` columns. Rotation is applied first, then the mirror
//! flips the rotated display horizontally. Coordinates are signed so devices
//! reporting points outside the grid never underflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::LinkError;
use crate::types::Grid;

/// Clockwise display rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next step clockwise, wrapping 270° back to 0°.
    pub fn next_clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether the display swaps rows and columns.
    pub fn is_transposed(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<u16> for Rotation {
    type Error = LinkError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(LinkError::config(format!("rotation must be 0, 90, 180 or 270, got {other}"))),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Axis-aligned display rectangle with sorted corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayRect {
    pub x_lo: i32,
    pub y_lo: i32,
    pub x_hi: i32,
    pub y_hi: i32,
}

/// Rotation and mirror applied to everything shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orientation {
    pub rotation: Rotation,
    pub mirror: bool,
}

impl Orientation {
    pub fn new(rotation: Rotation, mirror: bool) -> Self {
        Self { rotation, mirror }
    }

    /// Display `(rows, cols)` for a native `rows x cols` grid.
    pub fn display_dims(&self, rows: usize, cols: usize) -> (usize, usize) {
        if self.rotation.is_transposed() { (cols, rows) } else { (rows, cols) }
    }

    /// Map a native point to display coordinates.
    pub fn map_point(&self, x: i32, y: i32, rows: usize, cols: usize) -> (i32, i32) {
        let (r, c) = (rows as i32, cols as i32);
        let (dx, dy) = match self.rotation {
            Rotation::Deg0 => (x, y),
            Rotation::Deg90 => (r - 1 - y, x),
            Rotation::Deg180 => (c - 1 - x, r - 1 - y),
            Rotation::Deg270 => (y, c - 1 - x),
        };

        if self.mirror {
            let width = if self.rotation.is_transposed() { r } else { c };
            (width - 1 - dx, dy)
        } else {
            (dx, dy)
        }
    }

    /// Map a native box given by two opposite corners.
    pub fn map_box(&self, corner_a: (i32, i32), corner_b: (i32, i32), rows: usize, cols: usize) -> DisplayRect {
        let (ax, ay) = self.map_point(corner_a.0, corner_a.1, rows, cols);
        let (bx, by) = self.map_point(corner_b.0, corner_b.1, rows, cols);
        DisplayRect { x_lo: ax.min(bx), y_lo: ay.min(by), x_hi: ax.max(bx), y_hi: ay.max(by) }
    }

    /// New grid in display orientation. The input is left untouched.
    pub fn transform_grid<T: Copy>(&self, grid: &Grid<T>) -> Grid<T> {
        let (r, c) = (grid.rows(), grid.cols());
        let rotated = match self.rotation {
            Rotation::Deg0 => grid.clone(),
            Rotation::Deg90 => grid.remap(c, r, |row, col| (r - 1 - col, row)),
            Rotation::Deg180 => grid.remap(r, c, |row, col| (r - 1 - row, c - 1 - col)),
            Rotation::Deg270 => grid.remap(c, r, |row, col| (col, c - 1 - row)),
        };

        if self.mirror {
            let (rows, cols) = (rotated.rows(), rotated.cols());
            rotated.remap(rows, cols, |row, col| (row, cols - 1 - col))
        } else {
            rotated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated(rotation: Rotation) -> Orientation {
        Orientation::new(rotation, false)
    }

    #[test]
    fn origin_on_square_grid() {
        assert_eq!(rotated(Rotation::Deg0).map_point(0, 0, 8, 8), (0, 0));
        assert_eq!(rotated(Rotation::Deg90).map_point(0, 0, 8, 8), (7, 0));
        assert_eq!(rotated(Rotation::Deg180).map_point(0, 0, 8, 8), (7, 7));
        assert_eq!(rotated(Rotation::Deg270).map_point(0, 0, 8, 8), (0, 7));
    }

    #[test]
    fn mirror_after_rotation_is_not_commutative() {
        // Non-square grid, mirrored then rotated by hand
        let (rows, cols) = (24, 32);
        let rotate_then_mirror = Orientation::new(Rotation::Deg90, true).map_point(3, 5, rows, cols);

        let (mx, my) = Orientation::new(Rotation::Deg0, true).map_point(3, 5, rows, cols);
        let mirror_then_rotate = rotated(Rotation::Deg90).map_point(mx, my, rows, cols);

        assert_ne!(rotate_then_mirror, mirror_then_rotate);
    }

    #[test]
    fn out_of_grid_points_stay_signed() {
        assert_eq!(rotated(Rotation::Deg180).map_point(10, 9, 8, 8), (-3, -2));
    }

    #[test]
    fn boxes_are_sorted_after_mapping() {
        let rect = rotated(Rotation::Deg180).map_box((1, 2), (3, 5), 8, 8);
        assert_eq!(rect, DisplayRect { x_lo: 4, y_lo: 2, x_hi: 6, y_hi: 5 });
    }

    #[test]
    fn grid_transforms_agree_with_point_mapping() {
        let grid = Grid::from_cells(2, 3, vec![0, 1, 2, 3, 4, 5]).unwrap();

        for rotation in [Rotation::Deg0, Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            for mirror in [false, true] {
                let orientation = Orientation::new(rotation, mirror);
                let display = orientation.transform_grid(&grid);
                assert_eq!((display.rows(), display.cols()), orientation.display_dims(2, 3));

                for y in 0..2 {
                    for x in 0..3 {
                        let (dx, dy) = orientation.map_point(x as i32, y as i32, 2, 3);
                        assert_eq!(
                            display.get(dy as usize, dx as usize),
                            grid.get(y, x),
                            "{rotation} mirror={mirror} at ({x}, {y})"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn rotation_cycles_and_parses() {
        assert_eq!(Rotation::Deg270.next_clockwise(), Rotation::Deg0);
        assert_eq!(Rotation::try_from(180).unwrap(), Rotation::Deg180);
        assert!(Rotation::try_from(45).is_err());
        assert_eq!(u16::from(Rotation::Deg90), 90);
    }
}
