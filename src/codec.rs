// codec.rs - panorama decoding and diagnostic encoding through `image`

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use image::codecs::hdr::{HdrDecoder, HdrEncoder};
use image::io::Reader as ImageReader;
use image::{ColorType, ImageFormat, Rgb};

use crate::buffer::PixelBuffer;
use crate::error::{CubemapError, Result};
use crate::format::PixelFormat;

fn is_radiance(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("hdr"))
}

/// Decodes a panorama into a 3-channel buffer.
///
/// Radiance files keep their float samples; everything else the `image`
/// crate understands is decoded to 8-bit RGB.
pub fn load_panorama(path: impl AsRef<Path>) -> Result<PixelBuffer> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let guessed = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(|e| CubemapError::Decode(image::ImageError::IoError(e)))?;

    if guessed.format() == Some(ImageFormat::Hdr) || is_radiance(path) {
        let decoder = HdrDecoder::new(guessed.into_inner()).map_err(CubemapError::Decode)?;
        let meta = decoder.metadata();
        let (w, h) = (meta.width as usize, meta.height as usize);
        let pixels = decoder.read_image_hdr().map_err(CubemapError::Decode)?;
        log::info!("decoded radiance panorama {:?} ({}x{})", path, w, h);

        let samples = pixels.into_iter().flat_map(|p| p.0).collect();
        return PixelBuffer::from_f32_samples(w, h, 3, samples);
    }

    let mut guessed = guessed;
    guessed.no_limits();
    let img = guessed.decode().map_err(CubemapError::Decode)?.to_rgb8();
    let (w, h) = (img.width() as usize, img.height() as usize);
    log::info!("decoded 8-bit panorama {:?} ({}x{})", path, w, h);

    PixelBuffer::from_u8_samples(w, h, 3, img.into_raw())
}

fn linear_to_srgb8(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

/// Writes a buffer for inspection.
///
/// Float RGB goes to a `.hdr` path as Radiance data. Any other extension
/// selects an 8-bit format: float samples are clamped to [0, 1] and sRGB
/// encoded first.
pub fn save_diagnostic(path: impl AsRef<Path>, buffer: &PixelBuffer) -> Result<()> {
    let path = path.as_ref();
    let (w, h) = buffer.dimensions();

    match (buffer.format(), buffer.channels()) {
        (PixelFormat::Float32, 3) if !is_radiance(path) => {
            let bytes: Vec<u8> = buffer
                .to_f32_samples()
                .into_iter()
                .map(linear_to_srgb8)
                .collect();
            image::save_buffer(path, &bytes, w as u32, h as u32, ColorType::Rgb8)
                .map_err(CubemapError::Encode)?;
        }
        (PixelFormat::Float32, 3) => {
            let pixels: Vec<Rgb<f32>> = buffer
                .to_f32_samples()
                .chunks_exact(3)
                .map(|c| Rgb([c[0], c[1], c[2]]))
                .collect();
            let writer = BufWriter::new(File::create(path)?);
            HdrEncoder::new(writer)
                .encode(&pixels, w, h)
                .map_err(CubemapError::Encode)?;
        }
        (PixelFormat::Unsigned8, 3 | 4) => {
            let color = if buffer.channels() == 3 {
                ColorType::Rgb8
            } else {
                ColorType::Rgba8
            };
            image::save_buffer(path, buffer.as_bytes(), w as u32, h as u32, color)
                .map_err(CubemapError::Encode)?;
        }
        (_, channels) => return Err(CubemapError::UnsupportedChannels { channels }),
    }

    log::info!("wrote {}x{} diagnostic image to {:?}", w, h, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("skybox_cubemap_{}_{}", std::process::id(), name))
    }

    #[test]
    fn radiance_round_trip_keeps_shape() {
        let samples: Vec<f32> = (0..8 * 4 * 3).map(|i| (i % 7) as f32 * 0.5 + 0.25).collect();
        let buffer = PixelBuffer::from_f32_samples(8, 4, 3, samples).unwrap();

        let path = scratch("round_trip.hdr");
        save_diagnostic(&path, &buffer).unwrap();
        let loaded = load_panorama(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.dimensions(), (8, 4));
        assert_eq!(loaded.channels(), 3);
        assert_eq!(loaded.format(), PixelFormat::Float32);
        // RGBE shares one exponent per pixel: one step is 4/256 for values below 4
        for (a, b) in loaded.to_f32_samples().iter().zip(buffer.to_f32_samples()) {
            assert!((a - b).abs() < 0.02, "{a} vs {b}");
        }
    }

    #[test]
    fn png_panoramas_decode_as_unsigned8() {
        let bytes: Vec<u8> = (0..4 * 2 * 3).map(|i| (i * 10) as u8).collect();
        let buffer = PixelBuffer::from_u8_samples(4, 2, 3, bytes.clone()).unwrap();

        let path = scratch("ldr.png");
        save_diagnostic(&path, &buffer).unwrap();
        let loaded = load_panorama(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.format(), PixelFormat::Unsigned8);
        assert_eq!(loaded.as_bytes(), &bytes[..]);
    }

    #[test]
    fn float_crosses_export_as_png_by_extension() {
        let samples: Vec<f32> = (0..3 * 4 * 3).map(|i| (i % 3) as f32 * 2.0).collect();
        let buffer = PixelBuffer::from_f32_samples(3, 4, 3, samples).unwrap();

        let path = scratch("float_cross.png");
        save_diagnostic(&path, &buffer).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let loaded = load_panorama(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(bytes.starts_with(b"\x89PNG"));
        assert_eq!(loaded.dimensions(), (3, 4));
        assert_eq!(loaded.format(), PixelFormat::Unsigned8);
        // 0 stays black, 2 and 4 clamp to white
        assert_eq!(&loaded.as_bytes()[..3], &[0, 255, 255]);
    }

    #[test]
    fn linear_floats_are_srgb_encoded() {
        assert_eq!(linear_to_srgb8(-1.0), 0);
        assert_eq!(linear_to_srgb8(0.5), 188);
        assert_eq!(linear_to_srgb8(1.0), 255);
        assert_eq!(linear_to_srgb8(9.0), 255);
    }

    #[test]
    fn unsupported_channel_counts_are_rejected() {
        let buffer = PixelBuffer::new(2, 2, 2, PixelFormat::Float32).unwrap();
        assert!(matches!(
            save_diagnostic(scratch("never.hdr"), &buffer),
            Err(CubemapError::UnsupportedChannels { channels: 2 })
        ));
    }

    #[test]
    fn missing_files_fail_without_a_buffer() {
        assert!(load_panorama(scratch("does_not_exist.hdr")).is_err());
    }
}
