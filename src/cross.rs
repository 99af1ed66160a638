// cross.rs - equirectangular panorama -> vertical cross projection

use std::f32::consts::PI;

use glam::{Vec2, Vec3};
use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::error::{CubemapError, Result};
use crate::face::{cell_coordinate, CubeFace, CROSS_COLUMNS, CROSS_ROWS};
use crate::sampling::sample_channel;

/// Longitude (around +Y, 0 towards +Z, +pi/2 towards +X) and latitude
/// (+pi/2 at +Y) of a direction. The direction need not be normalized.
pub fn direction_to_spherical(dir: Vec3) -> Vec2 {
    let longitude = dir.x.atan2(dir.z);
    let latitude = (dir.y / dir.length()).clamp(-1.0, 1.0).asin();
    Vec2::new(longitude, latitude)
}

/// Fractional source position, in pixels, of a longitude/latitude pair on a
/// `width x height` panorama. `v` is clamped to the image.
pub fn spherical_to_equirect(spherical: Vec2, width: usize, height: usize) -> Vec2 {
    let u = (spherical.x / PI + 1.0) * 0.5 * width as f32;
    let v = ((0.5 - spherical.y / PI) * height as f32).clamp(0.0, height as f32);
    Vec2::new(u, v)
}

/// Face size a panorama of `width x height` projects to.
pub fn cross_face_size(width: usize, height: usize) -> Result<usize> {
    if height == 0 {
        return Err(CubemapError::invalid_dimensions(width, height, "panorama has no rows"));
    }
    let face_size = width / 4;
    if face_size == 0 {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "panorama is narrower than 4 pixels",
        ));
    }
    if width % 4 != 0 {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "panorama width must be a multiple of 4",
        ));
    }
    Ok(face_size)
}

/// Projects an equirectangular panorama onto a vertical cross of
/// `face_size * 3 x face_size * 4` pixels, `face_size = width / 4`.
///
/// The output keeps the source's channel count and format. Cells of the
/// grid that hold no face are left zeroed.
pub fn equirect_to_vertical_cross(src: &PixelBuffer) -> Result<PixelBuffer> {
    let (src_w, src_h) = src.dimensions();
    let face_size = cross_face_size(src_w, src_h)?;

    let mut dst = PixelBuffer::new(
        face_size * CROSS_COLUMNS,
        face_size * CROSS_ROWS,
        src.channels(),
        src.format(),
    )?;
    let layout = dst.layout();
    let row_stride = layout.row_stride();
    let pixel_stride = layout.pixel_stride();
    let bpc = layout.format.bytes_per_component();

    log::debug!(
        "projecting {}x{} panorama onto {}x{} cross",
        src_w,
        src_h,
        layout.width,
        layout.height
    );

    dst.as_bytes_mut()
        .par_chunks_mut(row_stride)
        .enumerate()
        .for_each(|(y, row)| {
            let cell_row = y / face_size;
            let b = cell_coordinate(y % face_size, face_size);

            for column in 0..CROSS_COLUMNS {
                let Some(face) = CubeFace::at_cell(column, cell_row) else {
                    continue;
                };
                for i in 0..face_size {
                    let a = cell_coordinate(i, face_size);
                    let spherical = direction_to_spherical(face.cross_direction(a, b));
                    let uv = spherical_to_equirect(spherical, src_w, src_h);

                    let x = column * face_size + i;
                    let pixel = &mut row[x * pixel_stride..(x + 1) * pixel_stride];
                    for (c, component) in pixel.chunks_exact_mut(bpc).enumerate() {
                        let value = sample_channel(src, uv.x, uv.y, c);
                        layout.format.write_component(component, value);
                    }
                }
            }
        });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    #[test]
    fn principal_directions_land_where_expected() {
        let (w, h) = (64, 32);
        let at = |dir: Vec3| spherical_to_equirect(direction_to_spherical(dir), w, h);
        let close = |a: Vec2, b: Vec2| (a - b).abs().max_element() < 1e-4;

        assert!(close(at(Vec3::Z), Vec2::new(32.0, 16.0)));
        assert!(close(at(Vec3::X), Vec2::new(48.0, 16.0)));
        assert!(close(at(Vec3::NEG_X), Vec2::new(16.0, 16.0)));
        // -Z sits on the seam, either edge is the same column
        assert!((at(Vec3::NEG_Z).x % w as f32).abs() < 1e-4);
        assert!(at(Vec3::Y).y.abs() < 1e-4);
        assert!((at(Vec3::NEG_Y).y - 32.0).abs() < 1e-4);
    }

    #[test]
    fn output_is_three_by_four_faces() {
        let src = PixelBuffer::new(32, 16, 3, PixelFormat::Float32).unwrap();
        let cross = equirect_to_vertical_cross(&src).unwrap();
        assert_eq!(cross.dimensions(), (24, 32));
        assert_eq!(cross.channels(), 3);
        assert_eq!(cross.format(), PixelFormat::Float32);
    }

    #[test]
    fn rejects_widths_that_do_not_split_into_faces() {
        for w in [1, 2, 3, 5, 6, 7] {
            let src = PixelBuffer::new(w, 2, 3, PixelFormat::Float32).unwrap();
            assert!(matches!(
                equirect_to_vertical_cross(&src),
                Err(CubemapError::InvalidDimensions { .. })
            ));
        }
    }

    #[test]
    fn empty_cells_stay_zero() {
        let samples = vec![1.0; 16 * 8 * 3];
        let src = PixelBuffer::from_f32_samples(16, 8, 3, samples).unwrap();
        let cross = equirect_to_vertical_cross(&src).unwrap();
        let n = 4;
        for (column, row) in [(0, 0), (2, 0), (0, 2), (2, 2), (0, 3), (2, 3)] {
            for y in row * n..(row + 1) * n {
                for x in column * n..(column + 1) * n {
                    assert_eq!(cross.pixel(x, y).unwrap().truncate(), Vec3::ZERO);
                }
            }
        }
        // and every face cell is filled with the constant
        for face in CubeFace::ALL {
            let cell = face.cell();
            let p = cross.pixel(cell.column * n + 1, cell.row * n + 2).unwrap();
            assert!((p.truncate() - Vec3::ONE).abs().max_element() < 1e-5);
        }
    }
}
