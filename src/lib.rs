//! Equirectangular panorama to cubemap conversion.
//!
//! The pipeline has two stages. [`equirect_to_vertical_cross`] projects a
//! longitude/latitude panorama onto a 3 x 4 vertical cross, and
//! [`vertical_cross_to_cube_faces`] cuts that cross into six square faces
//! ordered +X, -X, +Y, -Y, +Z, -Z, ready for a cube texture upload.
//!
//! ```no_run
//! let panorama = skybox_cubemap::load_panorama("data/piazza_bologni_1k.hdr")?;
//! let cross = skybox_cubemap::equirect_to_vertical_cross(&panorama)?;
//! let faces = skybox_cubemap::vertical_cross_to_cube_faces(&cross)?;
//! assert_eq!(faces.len(), 6);
//! # Ok::<(), skybox_cubemap::CubemapError>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod cross;
pub mod error;
pub mod face;
pub mod faces;
pub mod format;
pub mod sampling;

pub use buffer::PixelBuffer;
pub use codec::{load_panorama, save_diagnostic};
pub use cross::equirect_to_vertical_cross;
pub use error::{CubemapError, Result};
pub use face::CubeFace;
pub use faces::{equirect_to_cube_faces, vertical_cross_to_cube_faces, CubeFaces};
pub use format::{bytes_per_component, Layout, PixelFormat};
