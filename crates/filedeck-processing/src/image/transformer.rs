//! Image transformer - the [`ImageCodec`] backed by the `image` crate.

use crate::image::resize::ImageResize;
use crate::traits::{CropRect, ImageCodec};
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

const MAX_PREALLOCATED_BYTES: usize = 64 * 1024 * 1024;

/// Image codec running every decode/encode on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTransformer;

impl ImageTransformer {
    pub fn new() -> Self {
        Self
    }

    /// Detect image format from content type
    pub fn detect_format(content_type: &str) -> image::ImageFormat {
        match content_type {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => image::ImageFormat::Jpeg,
            "image/png" => image::ImageFormat::Png,
            "image/gif" => image::ImageFormat::Gif,
            "image/webp" => image::ImageFormat::WebP,
            _ => image::ImageFormat::Jpeg,
        }
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, anyhow::Error> {
        let cursor = Cursor::new(data);
        let img = image::ImageReader::new(cursor)
            .with_guessed_format()?
            .decode()?;
        Ok(img)
    }

    /// Output buffer hint: three bytes per pixel, capped.
    fn estimated_size(width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(3)
            .min(MAX_PREALLOCATED_BYTES)
    }

    fn encode(img: DynamicImage, format: image::ImageFormat) -> Result<Bytes, anyhow::Error> {
        // JPEG has no alpha channel
        let img = match format {
            image::ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            _ => img,
        };

        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(Self::estimated_size(width, height));
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, format)?;

        Ok(Bytes::from(buffer))
    }

    /// Decode, transform and re-encode on the blocking pool.
    async fn run<F>(data: Vec<u8>, mime_type: &str, op: F) -> Result<Bytes, anyhow::Error>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, anyhow::Error> + Send + 'static,
    {
        let format = Self::detect_format(mime_type);
        let start = std::time::Instant::now();

        let bytes = tokio::task::spawn_blocking(move || {
            let img = Self::decode(&data)?;
            let transformed = op(img)?;
            Self::encode(transformed, format)
        })
        .await??;

        tracing::debug!(
            format = ?format,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image transformed"
        );

        Ok(bytes)
    }
}

#[async_trait]
impl ImageCodec for ImageTransformer {
    async fn cover(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        width: u32,
        height: u32,
    ) -> Result<Bytes, anyhow::Error> {
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("Cover dimensions must be positive"));
        }
        Self::run(data, mime_type, move |img| Ok(ImageResize::cover(&img, width, height))).await
    }

    async fn crop(&self, data: Vec<u8>, mime_type: &str, rect: CropRect) -> Result<Bytes, anyhow::Error> {
        Self::run(data, mime_type, move |img| {
            let (width, height) = img.dimensions();
            let fits = rect.width > 0
                && rect.height > 0
                && rect.x.saturating_add(rect.width) <= width
                && rect.y.saturating_add(rect.height) <= height;
            if !fits {
                return Err(anyhow::anyhow!(
                    "Crop area {}x{}+{}+{} exceeds image bounds {}x{}",
                    rect.width,
                    rect.height,
                    rect.x,
                    rect.y,
                    width,
                    height
                ));
            }
            Ok(img.crop_imm(rect.x, rect.y, rect.width, rect.height))
        })
        .await
    }

    async fn resize(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        width: u32,
        height: u32,
    ) -> Result<Bytes, anyhow::Error> {
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("Resize dimensions must be positive"));
        }
        Self::run(data, mime_type, move |img| {
            Ok(ImageResize::resize_image(&img, width, height))
        })
        .await
    }

    async fn dimensions(&self, data: Vec<u8>) -> Result<(u32, u32), anyhow::Error> {
        let dimensions =
            tokio::task::spawn_blocking(move || Self::decode(&data).map(|img| img.dimensions()))
                .await??;
        Ok(dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([200, 10, 10, 128]),
        ));
        ImageTransformer::encode(img, image::ImageFormat::Png)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_estimated_size_does_not_overflow() {
        assert_eq!(ImageTransformer::estimated_size(10, 20), 600);
        assert_eq!(
            ImageTransformer::estimated_size(u32::MAX, u32::MAX),
            MAX_PREALLOCATED_BYTES
        );
        assert_eq!(
            ImageTransformer::estimated_size(70_000, 70_000),
            MAX_PREALLOCATED_BYTES
        );
    }

    #[tokio::test]
    async fn test_cover_keeps_media_type() {
        let codec = ImageTransformer::new();
        let thumb = codec.cover(png(300, 120), "image/png", 80, 80).await.unwrap();

        assert_eq!(
            image::guess_format(&thumb).unwrap(),
            image::ImageFormat::Png
        );
        assert_eq!(codec.dimensions(thumb.to_vec()).await.unwrap(), (80, 80));
    }

    #[tokio::test]
    async fn test_jpeg_output_from_alpha_source() {
        let codec = ImageTransformer::new();
        let out = codec.resize(png(64, 64), "image/jpeg", 32, 16).await.unwrap();

        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
        assert_eq!(codec.dimensions(out.to_vec()).await.unwrap(), (32, 16));
    }

    #[tokio::test]
    async fn test_crop_bounds() {
        let codec = ImageTransformer::new();
        let rect = CropRect {
            x: 10,
            y: 10,
            width: 20,
            height: 5,
        };
        let out = codec.crop(png(50, 50), "image/png", rect).await.unwrap();
        assert_eq!(codec.dimensions(out.to_vec()).await.unwrap(), (20, 5));

        let outside = CropRect {
            x: 40,
            y: 0,
            width: 20,
            height: 5,
        };
        assert!(codec.crop(png(50, 50), "image/png", outside).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_input_fails() {
        let codec = ImageTransformer::new();
        assert!(codec.dimensions(b"not an image".to_vec()).await.is_err());
        assert!(codec.cover(png(10, 10), "image/png", 0, 10).await.is_err());
    }
}
