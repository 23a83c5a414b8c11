// SPDX-License-Identifier: MIT
//! Image normalization to PNG and bitmap materialization

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
#[cfg(test)]
use mockall::automock;

use crate::asset::ImageSignature;
use crate::bitmap::{Bitmap, BitmapLoader};
use crate::error::{BundleError, CodecError};

/// Port for converting WebP bytes to PNG bytes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageTranscoder: Send + Sync {
    async fn transcode_webp_to_png(&self, webp: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// WebP to PNG transcoder backed by the `image` crate
#[cfg(feature = "image-codecs")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpToPngTranscoder;

#[cfg(feature = "image-codecs")]
#[async_trait]
impl ImageTranscoder for WebpToPngTranscoder {
    async fn transcode_webp_to_png(&self, webp: &[u8]) -> Result<Vec<u8>, CodecError> {
        let webp = webp.to_vec();

        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, CodecError> {
            let decoded = image::load_from_memory_with_format(&webp, image::ImageFormat::WebP)?;
            let mut png = std::io::Cursor::new(Vec::with_capacity(webp.len() * 2));
            decoded.write_to(&mut png, image::ImageFormat::Png)?;
            Ok(png.into_inner())
        })
        .await
        .map_err(|e| CodecError::Task(e.to_string()))?
    }
}

/// Image bytes ready for materialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Bytes handed to the bitmap loader
    pub bytes: Vec<u8>,

    /// Signature detected before normalization
    pub source: ImageSignature,

    /// Whether `bytes` were produced by the transcoder
    pub transcoded: bool,

    /// Transcoder error when WebP bytes were kept as-is
    pub transcode_error: Option<String>,
}

impl NormalizedImage {
    /// Standard base64 encoding of the canonical bytes
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Converts image entries to PNG
#[derive(Clone)]
pub struct ImageNormalizer {
    transcoder: Option<Arc<dyn ImageTranscoder>>,
}

impl ImageNormalizer {
    pub fn new(transcoder: Arc<dyn ImageTranscoder>) -> Self {
        Self {
            transcoder: Some(transcoder),
        }
    }

    /// Normalizer that never transcodes; WebP bytes pass through unchanged
    pub fn passthrough() -> Self {
        Self { transcoder: None }
    }

    /// Normalize image bytes
    ///
    /// Only WebP is transcoded. A transcode failure is logged and the
    /// original bytes are kept; it is never fatal.
    pub async fn normalize(
        &self,
        name: &str,
        bytes: Vec<u8>,
        signature: ImageSignature,
    ) -> NormalizedImage {
        let transcoder = match (&self.transcoder, signature.needs_transcode()) {
            (Some(transcoder), true) => transcoder,
            _ => {
                return NormalizedImage {
                    bytes,
                    source: signature,
                    transcoded: false,
                    transcode_error: None,
                }
            }
        };

        match transcoder.transcode_webp_to_png(&bytes).await {
            Ok(png) => {
                tracing::debug!(
                    entry = name,
                    webp_bytes = bytes.len(),
                    png_bytes = png.len(),
                    "Transcoded WebP to PNG"
                );
                NormalizedImage {
                    bytes: png,
                    source: signature,
                    transcoded: true,
                    transcode_error: None,
                }
            }
            Err(e) => {
                tracing::error!(entry = name, error = %e, "Failed to convert WebP to PNG");
                NormalizedImage {
                    bytes,
                    source: signature,
                    transcoded: false,
                    transcode_error: Some(e.to_string()),
                }
            }
        }
    }
}

impl std::fmt::Debug for ImageNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageNormalizer")
            .field("transcodes", &self.transcoder.is_some())
            .finish()
    }
}

/// Materialize a normalized image through the bitmap loader
///
/// Failure here is fatal for the bundle.
pub async fn materialize(
    loader: &dyn BitmapLoader,
    name: &str,
    image: &NormalizedImage,
) -> Result<Bitmap, BundleError> {
    loader
        .materialize(&image.to_base64())
        .await
        .map_err(|source| {
            tracing::error!(entry = name, error = %source, "Failed to load image");
            BundleError::Materialization {
                name: name.to_string(),
                source,
            }
        })
}
