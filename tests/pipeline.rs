use std::f32::consts::PI;

use glam::{Vec3, Vec4};
use skybox_cubemap::cross::{direction_to_spherical, spherical_to_equirect};
use skybox_cubemap::face::cell_coordinate;
use skybox_cubemap::sampling::sample_pixel_bilinear_wrapped;
use skybox_cubemap::{
    equirect_to_cube_faces, equirect_to_vertical_cross, vertical_cross_to_cube_faces, CubeFace,
    CubemapError, PixelBuffer, PixelFormat,
};

/// Smooth panorama: red and blue follow longitude, green follows latitude.
fn smooth_panorama(width: usize, height: usize) -> PixelBuffer {
    let mut samples = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let lon = ((x as f32 + 0.5) / width as f32 * 2.0 - 1.0) * PI;
            samples.push(0.5 + 0.5 * lon.sin());
            samples.push(y as f32 / height as f32);
            samples.push(0.5 + 0.5 * lon.cos());
        }
    }
    PixelBuffer::from_f32_samples(width, height, 3, samples).unwrap()
}

/// Value of one channel that depends on the row only.
fn row_gradient(width: usize, height: usize) -> PixelBuffer {
    let samples = (0..height)
        .flat_map(|y| std::iter::repeat(y as f32 / height as f32).take(width))
        .collect();
    PixelBuffer::from_f32_samples(width, height, 1, samples).unwrap()
}

/// Cube face addressing used by wgpu, Vulkan and D3D: direction for face
/// image coordinates `s` (right) and `t` (down), both in [-1, 1].
fn gpu_face_direction(slot: usize, s: f32, t: f32) -> Vec3 {
    match slot {
        0 => Vec3::new(1.0, -t, -s),
        1 => Vec3::new(-1.0, -t, s),
        2 => Vec3::new(s, 1.0, t),
        3 => Vec3::new(s, -1.0, -t),
        4 => Vec3::new(s, -t, 1.0),
        5 => Vec3::new(-s, -t, -1.0),
        _ => unreachable!(),
    }
}

fn expected_at(src: &PixelBuffer, dir: Vec3) -> Vec4 {
    let uv = spherical_to_equirect(direction_to_spherical(dir), src.width(), src.height());
    sample_pixel_bilinear_wrapped(src, uv.x, uv.y)
}

fn assert_close(a: Vec4, b: Vec4, tolerance: f32, what: &str) {
    assert!(
        (a - b).abs().max_element() <= tolerance,
        "{what}: {a:?} vs {b:?}"
    );
}

#[test]
fn standard_panoramas_give_three_by_four_crosses() {
    for w in [4, 8, 64, 256, 1024] {
        let src = PixelBuffer::new(w, w / 2, 3, PixelFormat::Float32).unwrap();
        let cross = equirect_to_vertical_cross(&src).unwrap();
        assert_eq!(cross.dimensions(), ((w / 4) * 3, (w / 4) * 4), "width {w}");
    }
}

#[test]
fn width_five_is_rejected() {
    let src = PixelBuffer::new(5, 2, 3, PixelFormat::Float32).unwrap();
    match equirect_to_vertical_cross(&src) {
        Err(CubemapError::InvalidDimensions { width, height, .. }) => {
            assert_eq!((width, height), (5, 2));
        }
        other => panic!("expected InvalidDimensions, got {other:?}"),
    }
}

#[test]
fn face_cell_centers_sample_their_axis() {
    // odd face size so each cell has a true center pixel
    let n = 7;
    let src = smooth_panorama(4 * n, 2 * n);
    let cross = equirect_to_vertical_cross(&src).unwrap();

    let axes = [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
    ];
    for (face, axis) in CubeFace::ALL.into_iter().zip(axes) {
        let cell = face.cell();
        let dir = face.cross_direction(0.0, 0.0);
        assert_eq!(dir, axis);
        let got = cross
            .pixel(cell.column * n + n / 2, cell.row * n + n / 2)
            .unwrap();
        // the signed zeros in `dir` pick the longitude at the poles
        assert_close(got, expected_at(&src, dir), 1e-4, face.label());
    }

    // +Z looks at longitude 0, latitude 0: the middle of the panorama
    let center = cross.pixel(n + n / 2, n + n / 2).unwrap();
    let middle = sample_pixel_bilinear_wrapped(&src, 2.0 * n as f32, n as f32);
    assert_close(center, middle, 1e-5, "+Z center");
}

#[test]
fn extracted_faces_follow_gpu_cube_addressing() {
    let n = 8;
    let src = smooth_panorama(4 * n, 2 * n);
    let faces = equirect_to_cube_faces(&src).unwrap();

    for (slot, (face, buffer)) in faces.iter().enumerate() {
        assert_eq!(face.index(), slot);
        for j in 0..n {
            for i in 0..n {
                let dir = gpu_face_direction(slot, cell_coordinate(i, n), cell_coordinate(j, n));
                let got = buffer.pixel(i, j).unwrap();
                assert_close(got, expected_at(&src, dir), 1e-3, face.label());
            }
        }
    }
}

#[test]
fn faces_are_equal_squares_of_a_third_of_the_cross() {
    let src = smooth_panorama(40, 20);
    let cross = equirect_to_vertical_cross(&src).unwrap();
    let faces = vertical_cross_to_cube_faces(&cross).unwrap();
    assert_eq!(faces.len(), 6);
    for buffer in faces.as_slice() {
        assert_eq!(buffer.dimensions(), (cross.width() / 3, cross.width() / 3));
        assert_eq!(buffer.format(), cross.format());
        assert_eq!(buffer.channels(), cross.channels());
    }
}

#[test]
fn row_constant_panoramas_have_no_seams_between_cells() {
    let n = 16;
    let src = row_gradient(4 * n, 2 * n);
    let cross = equirect_to_vertical_cross(&src).unwrap();
    let faces = vertical_cross_to_cube_faces(&cross).unwrap();
    let at = |face: CubeFace, i: usize, j: usize| faces.face(face).get(i, j, 0).unwrap();

    // pixel centers half a texel either side of an edge differ by at most
    // about one source row
    let tolerance = 1.5 / (2 * n) as f32;
    let last = n - 1;
    for k in 0..n {
        // around the equator
        assert!((at(CubeFace::NegativeX, last, k) - at(CubeFace::PositiveZ, 0, k)).abs() < tolerance);
        assert!((at(CubeFace::PositiveZ, last, k) - at(CubeFace::PositiveX, 0, k)).abs() < tolerance);
        assert!((at(CubeFace::PositiveX, last, k) - at(CubeFace::NegativeZ, 0, k)).abs() < tolerance);
        // -Z back to -X crosses the longitude seam
        assert!((at(CubeFace::NegativeZ, last, k) - at(CubeFace::NegativeX, 0, k)).abs() < tolerance);
    }
}

#[test]
fn longitude_seam_blends_both_edges() {
    // with an odd face size the -Z center looks exactly at longitude pi, half
    // way between the last and first source columns
    let n = 15;
    let src = smooth_panorama(4 * n, 2 * n);
    let cross = equirect_to_vertical_cross(&src).unwrap();
    let cell = CubeFace::NegativeZ.cell();
    let red = cross
        .get(cell.column * n + n / 2, cell.row * n + n / 2, 0)
        .unwrap();
    // sin is antisymmetric around the seam, so only a wrapped blend gives 0.5
    assert!((red - 0.5).abs() < 1e-4, "{red}");
}

#[test]
fn unsigned8_panoramas_run_the_whole_pipeline() {
    let (w, h) = (16, 8);
    let bytes = (0..w * h)
        .flat_map(|p| {
            let y = p / w;
            [200u8, (y * 30) as u8, 10]
        })
        .collect();
    let src = PixelBuffer::from_u8_samples(w, h, 3, bytes).unwrap();
    let faces = equirect_to_cube_faces(&src).unwrap();

    assert_eq!(faces.face_size(), 4);
    for buffer in faces.as_slice() {
        assert_eq!(buffer.format(), PixelFormat::Unsigned8);
        assert_eq!(buffer.as_bytes().len(), 4 * 4 * 3);
        // red is constant everywhere
        assert!(buffer.as_bytes().chunks_exact(3).all(|p| p[0] == 200));
    }
}

#[test]
fn minimal_panorama_gives_single_pixel_faces() {
    let src = smooth_panorama(4, 2);
    let faces = equirect_to_cube_faces(&src).unwrap();
    assert_eq!(faces.face_size(), 1);
    assert!(faces.as_slice().iter().all(|f| f.dimensions() == (1, 1)));
}
