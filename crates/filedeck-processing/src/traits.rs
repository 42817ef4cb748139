//! Image codec capability consumed by the browser.

use async_trait::async_trait;
use bytes::Bytes;

/// Rectangle selected by the user, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Opaque image transforms. Every method decodes `data`, transforms it and
/// re-encodes the result in the format matching `mime_type`.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Scale to cover `width`x`height` and crop the overflow around the center.
    async fn cover(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        width: u32,
        height: u32,
    ) -> Result<Bytes, anyhow::Error>;

    async fn crop(&self, data: Vec<u8>, mime_type: &str, rect: CropRect) -> Result<Bytes, anyhow::Error>;

    /// Resize to exactly `width`x`height`.
    async fn resize(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        width: u32,
        height: u32,
    ) -> Result<Bytes, anyhow::Error>;

    /// Width and height of the encoded image.
    async fn dimensions(&self, data: Vec<u8>) -> Result<(u32, u32), anyhow::Error>;
}
