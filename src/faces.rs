// faces.rs - vertical cross -> six upload-ready cube faces

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::cross::equirect_to_vertical_cross;
use crate::error::{CubemapError, Result};
use crate::face::{CubeFace, CROSS_COLUMNS, CROSS_ROWS};

/// Six square faces of equal size and format, in [`CubeFace::ALL`] order:
/// +X, -X, +Y, -Y, +Z, -Z. Slot `i` is meant for cube array layer `i`.
///
/// Face images follow the usual cubemap sampling convention: on +Z, image
/// right is +X and image down is -Y.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeFaces {
    faces: Vec<PixelBuffer>,
}

impl CubeFaces {
    pub fn face(&self, face: CubeFace) -> &PixelBuffer {
        &self.faces[face.index()]
    }

    pub fn face_size(&self) -> usize {
        self.faces[0].width()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CubeFace, &PixelBuffer)> {
        CubeFace::ALL.into_iter().zip(self.faces.iter())
    }

    pub fn as_slice(&self) -> &[PixelBuffer] {
        &self.faces
    }

    pub fn into_vec(self) -> Vec<PixelBuffer> {
        self.faces
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Face size of a vertical cross of `width x height`.
pub fn vertical_cross_face_size(width: usize, height: usize) -> Result<usize> {
    if width == 0 || width % CROSS_COLUMNS != 0 {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "cross width must be a positive multiple of 3",
        ));
    }
    if height == 0 || height % CROSS_ROWS != 0 {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "cross height must be a positive multiple of 4",
        ));
    }
    if width / CROSS_COLUMNS != height / CROSS_ROWS {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "cross cells are not square",
        ));
    }
    Ok(width / CROSS_COLUMNS)
}

fn extract_face(cross: &PixelBuffer, face: CubeFace, face_size: usize) -> Result<PixelBuffer> {
    let mut out = PixelBuffer::new(face_size, face_size, cross.channels(), cross.format())?;
    let pixel_stride = out.layout().pixel_stride();

    for (n, dst) in out.as_bytes_mut().chunks_exact_mut(pixel_stride).enumerate() {
        let (i, j) = (n % face_size, n / face_size);
        let (x, y) = face.cross_pixel(i, j, face_size);
        dst.copy_from_slice(cross.pixel_bytes(x, y));
    }
    Ok(out)
}

/// Slices a vertical cross into six faces, applying each face's fixed
/// orientation correction.
pub fn vertical_cross_to_cube_faces(cross: &PixelBuffer) -> Result<CubeFaces> {
    let (width, height) = cross.dimensions();
    let face_size = vertical_cross_face_size(width, height)?;

    log::debug!("slicing {}x{} cross into {}px faces", width, height, face_size);

    let faces = CubeFace::ALL
        .par_iter()
        .map(|&face| extract_face(cross, face, face_size))
        .collect::<Result<Vec<_>>>()?;

    Ok(CubeFaces { faces })
}

/// Both stages in one call.
pub fn equirect_to_cube_faces(panorama: &PixelBuffer) -> Result<CubeFaces> {
    let cross = equirect_to_vertical_cross(panorama)?;
    vertical_cross_to_cube_faces(&cross)
}
