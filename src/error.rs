// error.rs - failures reported by the conversion pipeline and codec adapter

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CubemapError {
    /// Input shape cannot produce a positive, integral face size.
    /// Raised before any output is allocated.
    #[error("invalid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        reason: &'static str,
    },

    /// Accessor called outside the buffer. A caller bug, not a data error.
    #[error("pixel ({x}, {y}) channel {channel} is outside a {width}x{height}x{channels} buffer")]
    OutOfRange {
        x: usize,
        y: usize,
        channel: usize,
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("{channels}-channel buffers cannot be encoded to this format")]
    UnsupportedChannels { channels: usize },

    #[error("failed to decode panorama: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CubemapError> = std::result::Result<T, E>;

impl CubemapError {
    pub(crate) fn invalid_dimensions(width: usize, height: usize, reason: &'static str) -> Self {
        CubemapError::InvalidDimensions {
            width,
            height,
            reason,
        }
    }
}
