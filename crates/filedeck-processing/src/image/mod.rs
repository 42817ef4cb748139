//! Image processing module

pub mod resize;
pub mod transformer;

pub use resize::ImageResize;
pub use transformer::ImageTransformer;
