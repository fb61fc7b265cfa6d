//! Image ingestion pipeline.
//!
//! A selected file is compressed when it is over the size threshold, then encoded
//! as a data URI for the preview and a bare base64 payload for the API.

mod compress;

pub use compress::*;

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::Config;
use crate::errors::AppError;

/// Text shown when a selected image cannot be used.
pub const IMAGE_FAILURE: &str = "Failed to process image. Please try again.";

/// A user-selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime.essence_str(), bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// An ingested image, ready for preview and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// `data:<mime>;base64,<payload>`
    pub preview: String,
    /// Base64 body without the data URI prefix
    pub payload: String,
}

impl EncodedImage {
    pub fn from_file(file: &ImageFile) -> Self {
        let payload = STANDARD.encode(&file.bytes);
        Self {
            preview: format!("data:{};base64,{}", file.mime, payload),
            payload,
        }
    }

    /// Split an existing data URI; the payload is the part after the comma.
    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let (_, payload) = uri.split_once(',')?;
        if payload.is_empty() {
            return None;
        }
        Some(Self {
            preview: uri.to_string(),
            payload: payload.to_string(),
        })
    }
}

/// Compress-if-large, then encode.
#[derive(Clone)]
pub struct ImagePipeline {
    threshold_bytes: u64,
    limits: CompressionLimits,
    compressor: Arc<dyn ImageCompressor>,
}

impl ImagePipeline {
    pub fn new(
        threshold_bytes: u64,
        limits: CompressionLimits,
        compressor: Arc<dyn ImageCompressor>,
    ) -> Self {
        Self {
            threshold_bytes,
            limits,
            compressor,
        }
    }

    /// Pipeline with the JPEG compressor and the configured limits.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.image_threshold_bytes,
            CompressionLimits {
                max_dimension: config.image_max_dimension,
                target_bytes: config.image_target_bytes,
            },
            Arc::new(JpegCompressor),
        )
    }

    /// Files strictly larger than the threshold are compressed.
    pub fn needs_compression(&self, file: &ImageFile) -> bool {
        file.size() > self.threshold_bytes
    }

    /// Run one file through the pipeline.
    ///
    /// Compression runs on the blocking pool. Failure is terminal for this
    /// attempt; nothing is retried.
    pub async fn ingest(&self, file: ImageFile) -> Result<EncodedImage, AppError> {
        if !file.is_image() {
            return Err(AppError::Image(format!(
                "{} is not an image ({})",
                file.name, file.mime
            )));
        }

        let file = if self.needs_compression(&file) {
            let compressor = Arc::clone(&self.compressor);
            let limits = self.limits;
            let original_size = file.size();
            let compressed = tokio::task::spawn_blocking(move || compressor.compress(&file, &limits))
                .await
                .map_err(|e| AppError::Image(format!("Image worker failed: {}", e)))??;
            tracing::debug!(
                original_size,
                compressed_size = compressed.size(),
                "Image compressed"
            );
            compressed
        } else {
            file
        };

        Ok(EncodedImage::from_file(&file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls and returns a fixed small file.
    struct CountingCompressor {
        calls: AtomicUsize,
    }

    impl ImageCompressor for CountingCompressor {
        fn compress(
            &self,
            file: &ImageFile,
            _limits: &CompressionLimits,
        ) -> Result<ImageFile, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ImageFile::new(&file.name, "image/jpeg", vec![1, 2, 3]))
        }
    }

    struct FailingCompressor;

    impl ImageCompressor for FailingCompressor {
        fn compress(&self, _: &ImageFile, _: &CompressionLimits) -> Result<ImageFile, AppError> {
            Err(AppError::Image("corrupt".to_string()))
        }
    }

    fn limits() -> CompressionLimits {
        CompressionLimits {
            max_dimension: 1024,
            target_bytes: 51_200,
        }
    }

    #[tokio::test]
    async fn test_compression_only_above_threshold() {
        let compressor = Arc::new(CountingCompressor {
            calls: AtomicUsize::new(0),
        });
        let pipeline = ImagePipeline::new(51_200, limits(), compressor.clone());

        let at_threshold = ImageFile::new("a.png", "image/png", vec![7; 51_200]);
        let encoded = pipeline.ingest(at_threshold.clone()).await.unwrap();
        assert_eq!(compressor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(encoded, EncodedImage::from_file(&at_threshold));

        let above = ImageFile::new("b.png", "image/png", vec![7; 51_201]);
        let encoded = pipeline.ingest(above).await.unwrap();
        assert_eq!(compressor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(encoded.payload, "AQID");
        assert_eq!(encoded.preview, "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn test_compression_failure_is_terminal() {
        let pipeline = ImagePipeline::new(10, limits(), Arc::new(FailingCompressor));
        let file = ImageFile::new("big.png", "image/png", vec![0; 100]);

        let err = pipeline.ingest(file).await.unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let pipeline = ImagePipeline::new(10, limits(), Arc::new(FailingCompressor));
        let file = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());

        assert!(matches!(
            pipeline.ingest(file).await.unwrap_err(),
            AppError::Image(_)
        ));
    }

    #[test]
    fn test_data_uri_split() {
        let encoded = EncodedImage::from_data_uri("data:image/png;base64,iVBORw0").unwrap();
        assert_eq!(encoded.payload, "iVBORw0");
        assert!(EncodedImage::from_data_uri("no-comma").is_none());
        assert!(EncodedImage::from_data_uri("data:image/png;base64,").is_none());
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        tokio::fs::write(&path, [1u8, 2, 3]).await.unwrap();

        let file = ImageFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "logo.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.size(), 3);
    }
}
