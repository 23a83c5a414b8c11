// SPDX-License-Identifier: MIT
//! Asset classification for decompressed entries

use std::borrow::Cow;
use std::fmt;

use crate::format::{
    DESCRIPTOR_SUFFIX, PNG_MAGIC, RIFF_FORM_OFFSET, RIFF_TAG, UTF8_BOM, WEBP_SIGNATURE_LEN,
    WEBP_TAG,
};

/// Image format detected from leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSignature {
    /// RIFF container with a WEBP form type
    WebP,

    /// PNG signature
    Png,

    /// Anything else; passed through unchanged
    Unknown,
}

impl ImageSignature {
    /// Detect the signature of image bytes
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= WEBP_SIGNATURE_LEN
            && data[..RIFF_TAG.len()] == RIFF_TAG[..]
            && data[RIFF_FORM_OFFSET..WEBP_SIGNATURE_LEN] == WEBP_TAG[..]
        {
            return ImageSignature::WebP;
        }

        if data.len() >= PNG_MAGIC.len() && data[..PNG_MAGIC.len()] == PNG_MAGIC[..] {
            return ImageSignature::Png;
        }

        ImageSignature::Unknown
    }

    /// MIME type of the signature, if known
    pub fn mime_type(&self) -> Option<&'static str> {
        match self {
            ImageSignature::WebP => Some("image/webp"),
            ImageSignature::Png => Some("image/png"),
            ImageSignature::Unknown => None,
        }
    }

    /// Whether bytes with this signature need transcoding to PNG
    #[inline]
    pub fn needs_transcode(&self) -> bool {
        matches!(self, ImageSignature::WebP)
    }
}

impl fmt::Display for ImageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageSignature::WebP => "webp",
            ImageSignature::Png => "png",
            ImageSignature::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Category of a bundle entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// JSON descriptor text
    Descriptor,

    /// Image bytes with their detected signature
    Image(ImageSignature),
}

/// Classify an entry by its name and decompressed bytes
///
/// Names ending in `.json` are descriptors and never inspected as images.
/// Every other entry is an image.
pub fn classify(name: &str, data: &[u8]) -> AssetKind {
    if is_descriptor_name(name) {
        AssetKind::Descriptor
    } else {
        AssetKind::Image(ImageSignature::detect(data))
    }
}

/// Case-sensitive `.json` suffix check
#[inline]
pub fn is_descriptor_name(name: &str) -> bool {
    name.ends_with(DESCRIPTOR_SUFFIX)
}

/// Descriptor bytes as text
///
/// A single leading BOM is dropped and invalid UTF-8 sequences become
/// U+FFFD, so only the JSON grammar can reject a descriptor.
pub fn descriptor_text(data: &[u8]) -> Cow<'_, str> {
    let data = data.strip_prefix(&UTF8_BOM[..]).unwrap_or(data);
    String::from_utf8_lossy(data)
}
