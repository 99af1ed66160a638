// buffer.rs - owned 2D pixel storage shared by every pipeline stage

use glam::Vec4;

use crate::error::{CubemapError, Result};
use crate::format::{Layout, PixelFormat};

pub const MAX_CHANNELS: usize = 4;

/// A `width x height` image with 1 to 4 interleaved channels.
///
/// The byte store always holds exactly
/// `width * height * channels * bytes_per_component(format)` bytes.
/// Samples go in and out as `f32`; `Unsigned8` maps them onto `0..=255`.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    layout: Layout,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.layout.width)
            .field("height", &self.layout.height)
            .field("channels", &self.layout.channels)
            .field("format", &self.layout.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn check_shape(width: usize, height: usize, channels: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "width and height must be positive",
        ));
    }
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(CubemapError::invalid_dimensions(
            width,
            height,
            "channel count must be between 1 and 4",
        ));
    }
    Ok(())
}

impl PixelBuffer {
    /// Zero-filled buffer.
    pub fn new(width: usize, height: usize, channels: usize, format: PixelFormat) -> Result<Self> {
        check_shape(width, height, channels)?;
        let layout = Layout::new(width, height, channels, format);
        Ok(Self {
            data: vec![0; layout.len()],
            layout,
        })
    }

    /// Wraps decoder output: row-major, top to bottom, interleaved channels.
    pub fn from_f32_samples(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<f32>,
    ) -> Result<Self> {
        check_shape(width, height, channels)?;
        if samples.len() != width * height * channels {
            return Err(CubemapError::invalid_dimensions(
                width,
                height,
                "sample count does not match width * height * channels",
            ));
        }
        let layout = Layout::new(width, height, channels, PixelFormat::Float32);
        let mut data = Vec::with_capacity(layout.len());
        for sample in samples {
            data.extend_from_slice(&sample.to_ne_bytes());
        }
        Ok(Self { layout, data })
    }

    pub fn from_u8_samples(
        width: usize,
        height: usize,
        channels: usize,
        samples: Vec<u8>,
    ) -> Result<Self> {
        check_shape(width, height, channels)?;
        if samples.len() != width * height * channels {
            return Err(CubemapError::invalid_dimensions(
                width,
                height,
                "sample count does not match width * height * channels",
            ));
        }
        Ok(Self {
            layout: Layout::new(width, height, channels, PixelFormat::Unsigned8),
            data: samples,
        })
    }

    pub fn width(&self) -> usize {
        self.layout.width
    }

    pub fn height(&self) -> usize {
        self.layout.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.layout.width, self.layout.height)
    }

    pub fn channels(&self) -> usize {
        self.layout.channels
    }

    pub fn format(&self) -> PixelFormat {
        self.layout.format
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Every component as `f32`, in storage order.
    pub fn to_f32_samples(&self) -> Vec<f32> {
        let format = self.layout.format;
        self.data
            .chunks_exact(format.bytes_per_component())
            .map(|c| format.read_component(c))
            .collect()
    }

    fn check_range(&self, x: usize, y: usize, channel: usize) -> Result<()> {
        let l = &self.layout;
        if x >= l.width || y >= l.height || channel >= l.channels {
            return Err(CubemapError::OutOfRange {
                x,
                y,
                channel,
                width: l.width,
                height: l.height,
                channels: l.channels,
            });
        }
        Ok(())
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> Result<f32> {
        self.check_range(x, y, channel)?;
        Ok(self.sample(x, y, channel))
    }

    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f32) -> Result<()> {
        self.check_range(x, y, channel)?;
        let offset = self.layout.offset(x, y, channel);
        self.layout
            .format
            .write_component(&mut self.data[offset..], value);
        Ok(())
    }

    /// Reads a whole pixel. Missing color channels read as 0, missing alpha as 1.
    pub fn pixel(&self, x: usize, y: usize) -> Result<Vec4> {
        self.check_range(x, y, 0)?;
        let mut out = Vec4::new(0.0, 0.0, 0.0, 1.0);
        for c in 0..self.layout.channels {
            out[c] = self.sample(x, y, c);
        }
        Ok(out)
    }

    /// Writes the first `channels` components of `value`.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: Vec4) -> Result<()> {
        self.check_range(x, y, 0)?;
        for c in 0..self.layout.channels {
            let offset = self.layout.offset(x, y, c);
            self.layout
                .format
                .write_component(&mut self.data[offset..], value[c]);
        }
        Ok(())
    }

    /// Unchecked read for hot loops; callers guarantee the coordinates.
    #[inline]
    pub(crate) fn sample(&self, x: usize, y: usize, channel: usize) -> f32 {
        let offset = self.layout.offset(x, y, channel);
        self.layout.format.read_component(&self.data[offset..])
    }

    /// Raw bytes of one pixel.
    #[inline]
    pub(crate) fn pixel_bytes(&self, x: usize, y: usize) -> &[u8] {
        let start = self.layout.pixel_offset(x, y);
        &self.data[start..start + self.layout.pixel_stride()]
    }
}
