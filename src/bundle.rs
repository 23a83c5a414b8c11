// SPDX-License-Identifier: MIT
//! Parsed bundle result

use serde_json::Value;

use crate::bitmap::Bitmap;
use crate::error::Degradation;

/// Fully decoded bundle
///
/// Built once per decode call and never mutated afterwards. Each slot is
/// `None` when the bundle had no entry of that category.
#[derive(Debug, Clone)]
pub struct ParsedBundle {
    pub(crate) descriptor: Option<Value>,
    pub(crate) image: Option<DecodedImage>,
    pub(crate) entry_count: usize,
    pub(crate) diagnostics: Vec<Degradation>,
}

/// Image slot of a bundle
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Name of the entry the image came from
    pub name: String,

    /// Bytes handed to the bitmap loader (PNG unless transcode degraded)
    pub canonical_bytes: Vec<u8>,

    /// Materialized bitmap
    pub bitmap: Bitmap,
}

impl ParsedBundle {
    /// JSON descriptor from the last `.json` entry
    pub fn descriptor(&self) -> Option<&Value> {
        self.descriptor.as_ref()
    }

    /// Bitmap from the last image entry
    pub fn bitmap(&self) -> Option<&Bitmap> {
        self.image.as_ref().map(|image| &image.bitmap)
    }

    /// Canonical image bytes from the last image entry
    pub fn canonical_image_bytes(&self) -> Option<&[u8]> {
        self.image.as_ref().map(|image| image.canonical_bytes.as_slice())
    }

    /// Entry name of the retained image
    pub fn image_name(&self) -> Option<&str> {
        self.image.as_ref().map(|image| image.name.as_str())
    }

    /// Number of entries processed
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Recoverable failures absorbed while decoding
    pub fn diagnostics(&self) -> &[Degradation] {
        &self.diagnostics
    }

    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Split into descriptor and image slots
    pub fn into_parts(self) -> (Option<Value>, Option<DecodedImage>) {
        (self.descriptor, self.image)
    }
}
