// face.rs - the face table shared by the cross projection and the face slicer
//
// Vertical cross, 3 x 4 cells, seen from inside the cube:
//
//          +----+
//          | +Y |
//     +----+----+----+
//     | -X | +Z | +X |
//     +----+----+----+
//          | -Y |
//          +----+
//          | -Z |
//          +----+
//
// World frame is the cubemap sampling frame: +Y up, and looking down +Z the
// +X axis is to the right. -Z sits below -Y so its top edge meets -Y's bottom
// edge, which leaves it upside down relative to the GPU face convention.

use glam::Vec3;

/// Cube face, in GPU array-layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

/// How a cell of the cross must be turned to become an upload-ready face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceOrientation {
    Identity,
    Rotate180,
}

/// One row of the face table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCell {
    pub column: usize,
    pub row: usize,
    pub orientation: FaceOrientation,
}

pub const CROSS_COLUMNS: usize = 3;
pub const CROSS_ROWS: usize = 4;

impl CubeFace {
    /// Slot order of the output face array and of the GPU cube layers.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<CubeFace> {
        Self::ALL.get(index).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            CubeFace::PositiveX => "+X",
            CubeFace::NegativeX => "-X",
            CubeFace::PositiveY => "+Y",
            CubeFace::NegativeY => "-Y",
            CubeFace::PositiveZ => "+Z",
            CubeFace::NegativeZ => "-Z",
        }
    }

    pub const fn cell(self) -> FaceCell {
        let (column, row, orientation) = match self {
            CubeFace::PositiveY => (1, 0, FaceOrientation::Identity),
            CubeFace::NegativeX => (0, 1, FaceOrientation::Identity),
            CubeFace::PositiveZ => (1, 1, FaceOrientation::Identity),
            CubeFace::PositiveX => (2, 1, FaceOrientation::Identity),
            CubeFace::NegativeY => (1, 2, FaceOrientation::Identity),
            CubeFace::NegativeZ => (1, 3, FaceOrientation::Rotate180),
        };
        FaceCell {
            column,
            row,
            orientation,
        }
    }

    /// Face occupying grid cell `(column, row)`, if any.
    pub fn at_cell(column: usize, row: usize) -> Option<CubeFace> {
        Self::ALL.into_iter().find(|f| {
            let cell = f.cell();
            cell.column == column && cell.row == row
        })
    }

    /// Point on the unit cube for cell coordinates `a` (left to right) and
    /// `b` (top to bottom), both in `[-1, 1]`, as laid out in the cross.
    pub fn cross_direction(self, a: f32, b: f32) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::new(a, 1.0, b),
            CubeFace::NegativeX => Vec3::new(-1.0, -b, a),
            CubeFace::PositiveZ => Vec3::new(a, -b, 1.0),
            CubeFace::PositiveX => Vec3::new(1.0, -b, -a),
            CubeFace::NegativeY => Vec3::new(a, -1.0, -b),
            CubeFace::NegativeZ => Vec3::new(a, b, -1.0),
        }
    }

    /// Cross pixel that lands on pixel `(i, j)` of the extracted face.
    #[inline]
    pub fn cross_pixel(self, i: usize, j: usize, face_size: usize) -> (usize, usize) {
        let cell = self.cell();
        let (ci, cj) = match cell.orientation {
            FaceOrientation::Identity => (i, j),
            FaceOrientation::Rotate180 => (face_size - 1 - i, face_size - 1 - j),
        };
        (cell.column * face_size + ci, cell.row * face_size + cj)
    }
}

/// Maps a pixel index to the normalized coordinate of its center.
#[inline]
pub fn cell_coordinate(index: usize, face_size: usize) -> f32 {
    2.0 * (index as f32 + 0.5) / face_size as f32 - 1.0
}
