// sampling.rs - bilinear reads from an equirectangular source

use glam::Vec4;

use crate::buffer::PixelBuffer;
use crate::error::{CubemapError, Result};

/// The four texels and weights around a fractional position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Footprint {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    s: f32,
    t: f32,
}

/// `u`, `v` are in pixel units with texel centers at `+0.5`.
/// Columns wrap around, rows clamp at the poles.
fn footprint(width: usize, height: usize, u: f32, v: f32) -> Footprint {
    let x = u - 0.5;
    let y = (v - 0.5).clamp(0.0, (height - 1) as f32);

    let xf = x.floor();
    let yf = y.floor();

    let w = width as i64;
    let x0 = (xf as i64).rem_euclid(w) as usize;
    let x1 = (x0 + 1) % width;
    let y0 = yf as usize;
    let y1 = (y0 + 1).min(height - 1);

    Footprint {
        x0,
        x1,
        y0,
        y1,
        s: x - xf,
        t: y - yf,
    }
}

/// Bilinear sample of one channel, wrapping horizontally and clamping
/// vertically.
///
/// Fails with [`CubemapError::OutOfRange`] when `channel` is not below
/// `src.channels()`; the reported position is the nearest source texel.
pub fn sample_bilinear_wrapped(src: &PixelBuffer, u: f32, v: f32, channel: usize) -> Result<f32> {
    if channel >= src.channels() {
        let fp = footprint(src.width(), src.height(), u, v);
        return Err(CubemapError::OutOfRange {
            x: fp.x0,
            y: fp.y0,
            channel,
            width: src.width(),
            height: src.height(),
            channels: src.channels(),
        });
    }
    Ok(sample_channel(src, u, v, channel))
}

/// Unchecked form for the conversion loops, which iterate `0..channels`.
pub(crate) fn sample_channel(src: &PixelBuffer, u: f32, v: f32, channel: usize) -> f32 {
    let fp = footprint(src.width(), src.height(), u, v);

    let a = src.sample(fp.x0, fp.y0, channel);
    let b = src.sample(fp.x1, fp.y0, channel);
    let c = src.sample(fp.x0, fp.y1, channel);
    let d = src.sample(fp.x1, fp.y1, channel);

    a * (1.0 - fp.s) * (1.0 - fp.t)
        + b * fp.s * (1.0 - fp.t)
        + c * (1.0 - fp.s) * fp.t
        + d * fp.s * fp.t
}

/// All channels at once; unused lanes follow [`PixelBuffer::pixel`].
pub fn sample_pixel_bilinear_wrapped(src: &PixelBuffer, u: f32, v: f32) -> Vec4 {
    let mut out = Vec4::new(0.0, 0.0, 0.0, 1.0);
    for c in 0..src.channels() {
        out[c] = sample_channel(src, u, v, c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn ramp(width: usize, height: usize) -> PixelBuffer {
        let samples = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x + 10 * y) as f32))
            .collect();
        PixelBuffer::from_f32_samples(width, height, 1, samples).unwrap()
    }

    #[test]
    fn texel_centers_return_the_texel() {
        let src = ramp(4, 3);
        assert_eq!(sample_channel(&src, 0.5, 0.5, 0), 0.0);
        assert_eq!(sample_channel(&src, 2.5, 1.5, 0), 12.0);
    }

    #[test]
    fn interpolates_between_neighbours() {
        let src = ramp(4, 3);
        // halfway between x=1 and x=2 on row 0
        assert!((sample_channel(&src, 2.0, 0.5, 0) - 1.5).abs() < 1e-6);
        // halfway between rows 0 and 1
        assert!((sample_channel(&src, 0.5, 1.0, 0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn wraps_across_the_seam() {
        let src = ramp(4, 1);
        // between the last column (3) and the first (0)
        assert!((sample_channel(&src, 4.0, 0.5, 0) - 1.5).abs() < 1e-6);
        assert!((sample_channel(&src, 0.0, 0.5, 0) - 1.5).abs() < 1e-6);
        // a full turn lands on the same texel
        assert_eq!(
            sample_channel(&src, 1.5 + 4.0, 0.5, 0),
            sample_channel(&src, 1.5, 0.5, 0)
        );
    }

    #[test]
    fn clamps_at_the_poles() {
        let src = ramp(4, 3);
        assert_eq!(sample_channel(&src, 1.5, -3.0, 0), 1.0);
        assert_eq!(sample_channel(&src, 1.5, 0.0, 0), 1.0);
        assert_eq!(sample_channel(&src, 1.5, 3.0, 0), 21.0);
        assert_eq!(sample_channel(&src, 1.5, 99.0, 0), 21.0);
    }

    #[test]
    fn checked_sampling_rejects_missing_channels() {
        let src = PixelBuffer::from_f32_samples(2, 1, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(sample_bilinear_wrapped(&src, 1.5, 0.5, 2).unwrap(), 6.0);
        assert!(matches!(
            sample_bilinear_wrapped(&src, 0.5, 0.5, 3),
            Err(CubemapError::OutOfRange {
                x: 0,
                y: 0,
                channel: 3,
                channels: 3,
                ..
            })
        ));
    }

    #[test]
    fn unsigned8_sources_are_normalized() {
        let src = PixelBuffer::from_u8_samples(2, 1, 3, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let p = sample_pixel_bilinear_wrapped(&src, 1.0, 0.5);
        assert!((p.x - 0.5).abs() < 1e-6);
        assert_eq!(p.y, 0.0);
        assert!((p.z - 0.5).abs() < 1e-6);
        assert_eq!(p.w, 1.0);
        assert_eq!(src.format(), PixelFormat::Unsigned8);
    }
}
