// SPDX-License-Identifier: MIT
//! Bitmap materialization

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::CodecError;

/// Decoded RGBA8 bitmap handed to rendering surfaces
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Bitmap {
    /// Build from a tightly packed RGBA8 buffer
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (rgba.len() == expected).then_some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixels, row-major
    pub fn as_rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.rgba
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Port for turning base64-encoded PNG data into a bitmap
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BitmapLoader: Send + Sync {
    /// Decode base64 image data, requested as PNG
    async fn materialize(&self, base64_png: &str) -> Result<Bitmap, CodecError>;
}

/// Bitmap loader backed by the `image` crate
///
/// Like a `data:image/png` load in a browser canvas, the actual format is
/// sniffed from the bytes, so untranscoded WebP still decodes.
#[cfg(feature = "image-codecs")]
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageBitmapLoader;

#[cfg(feature = "image-codecs")]
#[async_trait]
impl BitmapLoader for ImageBitmapLoader {
    async fn materialize(&self, base64_png: &str) -> Result<Bitmap, CodecError> {
        use base64::Engine;

        let bytes = base64::engine::general_purpose::STANDARD.decode(base64_png)?;

        tokio::task::spawn_blocking(move || -> Result<Bitmap, CodecError> {
            let rgba = image::load_from_memory(&bytes)?.to_rgba8();
            let (width, height) = rgba.dimensions();
            Bitmap::from_rgba(width, height, rgba.into_raw()).ok_or_else(|| {
                CodecError::Unsupported(format!("inconsistent {}x{} bitmap", width, height))
            })
        })
        .await
        .map_err(|e| CodecError::Task(e.to_string()))?
    }
}
