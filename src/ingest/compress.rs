//! Lossy image compression.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use super::ImageFile;
use crate::errors::AppError;

/// Quality ladder tried at each size before shrinking further.
const QUALITY_STEPS: &[u8] = &[85, 75, 65, 55, 45, 35, 25];

/// Below this edge length the compressor stops shrinking and returns its best try.
const MIN_EDGE: u32 = 64;

/// Size constraints for a compressed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLimits {
    /// Longest edge, in pixels
    pub max_dimension: u32,
    /// Size the encoded file should fit in
    pub target_bytes: u64,
}

/// Turns a large image into a smaller one.
///
/// Runs on a blocking thread, so implementations may do CPU-heavy work.
pub trait ImageCompressor: Send + Sync {
    fn compress(&self, file: &ImageFile, limits: &CompressionLimits) -> Result<ImageFile, AppError>;
}

/// Re-encodes as JPEG, lowering quality and then dimensions until the target
/// size is met.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCompressor;

impl ImageCompressor for JpegCompressor {
    fn compress(&self, file: &ImageFile, limits: &CompressionLimits) -> Result<ImageFile, AppError> {
        let decoded = image::load_from_memory(&file.bytes)?;
        let mut img = fit_within(decoded, limits.max_dimension);

        loop {
            let mut smallest: Option<Vec<u8>> = None;
            for &quality in QUALITY_STEPS {
                let encoded = encode_jpeg(&img, quality)?;
                if encoded.len() as u64 <= limits.target_bytes {
                    return Ok(ImageFile::new(&file.name, "image/jpeg", encoded));
                }
                smallest = Some(encoded);
            }

            if img.width() <= MIN_EDGE && img.height() <= MIN_EDGE {
                tracing::warn!(
                    name = %file.name,
                    target = limits.target_bytes,
                    "Image could not reach target size"
                );
                let best = smallest.unwrap_or_default();
                return Ok(ImageFile::new(&file.name, "image/jpeg", best));
            }

            let width = (img.width() * 3 / 4).max(1);
            let height = (img.height() * 3 / 4).max(1);
            img = img.resize(width, height, FilterType::Triangle);
        }
    }
}

fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Triangle)
    } else {
        img
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, AppError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
        encoder.encode_image(&rgb)?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    /// Noisy PNG that does not compress well.
    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut seed: u32 = 0x2545_f491;
        let img = ImageBuffer::from_fn(width, height, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            Rgb([r, g, b])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_compresses_to_limits() {
        let bytes = noisy_png(1600, 1200);
        assert!(bytes.len() > 51_200);
        let file = ImageFile::new("photo.png", "image/png", bytes);
        let limits = CompressionLimits {
            max_dimension: 1024,
            target_bytes: 51_200,
        };

        let out = JpegCompressor.compress(&file, &limits).unwrap();
        assert_eq!(out.mime, "image/jpeg");
        assert_eq!(out.name, "photo.png");
        assert!(out.size() <= 51_200);

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert!(decoded.width() <= 1024);
        assert!(decoded.height() <= 1024);
    }

    #[test]
    fn test_garbage_input_fails() {
        let file = ImageFile::new("broken.png", "image/png", vec![0; 4096]);
        let limits = CompressionLimits {
            max_dimension: 1024,
            target_bytes: 1024,
        };
        let err = JpegCompressor.compress(&file, &limits).unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }
}
