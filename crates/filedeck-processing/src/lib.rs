//! Filedeck Processing Library
//!
//! The image codec used by the file browser: cover-cropped thumbnails,
//! rectangular crops, exact resizes and dimension lookups, each re-encoded in
//! the source's media type.

#[cfg(feature = "image")]
pub mod image;
pub mod traits;

#[cfg(feature = "image")]
pub use image::ImageTransformer;
pub use traits::{CropRect, ImageCodec};
