// format.rs - component sizes and byte strides for pixel buffers

/// Storage type of a single component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One byte per component, normalized to [0, 1] on read.
    Unsigned8,
    /// Native-endian `f32` per component.
    Float32,
}

impl PixelFormat {
    pub const fn bytes_per_component(self) -> usize {
        match self {
            PixelFormat::Unsigned8 => 1,
            PixelFormat::Float32 => 4,
        }
    }

    /// Decodes one component starting at `bytes[0]`.
    #[inline]
    pub fn read_component(self, bytes: &[u8]) -> f32 {
        match self {
            PixelFormat::Unsigned8 => f32::from(bytes[0]) / 255.0,
            PixelFormat::Float32 => f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Encodes one component into `bytes[..bytes_per_component()]`.
    #[inline]
    pub fn write_component(self, bytes: &mut [u8], value: f32) {
        match self {
            PixelFormat::Unsigned8 => {
                // NaN clamps to 0 through the saturating cast
                bytes[0] = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            PixelFormat::Float32 => bytes[..4].copy_from_slice(&value.to_ne_bytes()),
        }
    }
}

/// Free-function form of [`PixelFormat::bytes_per_component`].
pub const fn bytes_per_component(format: PixelFormat) -> usize {
    format.bytes_per_component()
}

/// Byte geometry of a `width x height` image with interleaved channels.
///
/// Rows are tightly packed, top to bottom, no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub format: PixelFormat,
}

impl Layout {
    pub const fn new(width: usize, height: usize, channels: usize, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            channels,
            format,
        }
    }

    pub const fn pixel_stride(&self) -> usize {
        self.channels * self.format.bytes_per_component()
    }

    pub const fn row_stride(&self) -> usize {
        self.width * self.pixel_stride()
    }

    /// Total byte length of the image.
    pub const fn len(&self) -> usize {
        self.height * self.row_stride()
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte offset of the first byte of pixel `(x, y)`.
    pub const fn pixel_offset(&self, x: usize, y: usize) -> usize {
        y * self.row_stride() + x * self.pixel_stride()
    }

    /// Byte offset of `channel` of pixel `(x, y)`. No bounds checks.
    pub const fn offset(&self, x: usize, y: usize, channel: usize) -> usize {
        self.pixel_offset(x, y) + channel * self.format.bytes_per_component()
    }

    /// Same geometry with a different size, used to derive output layouts.
    pub const fn with_size(&self, width: usize, height: usize) -> Self {
        Self::new(width, height, self.channels, self.format)
    }
}
