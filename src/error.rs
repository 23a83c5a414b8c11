// SPDX-License-Identifier: MIT
//! Error and diagnostic types
//!
//! Fatal outcomes are `BundleError` and abort the decode. Recoverable outcomes
//! are `Degradation` records kept on the parsed bundle; they never surface as
//! the result of a decode call.

use std::fmt;

/// Fatal errors that abort a bundle decode
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("Malformed zstd frame in {context}: {source}")]
    MalformedCompression {
        context: String,
        #[source]
        source: CodecError,
    },

    #[error("Invalid JSON descriptor in {name}: {source}")]
    JsonParse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to materialize image {name}: {source}")]
    Materialization {
        name: String,
        #[source]
        source: CodecError,
    },

    #[error("Entry count {declared} exceeds configured limit {limit}")]
    EntryLimitExceeded { declared: u16, limit: u16 },

    #[error("Unsupported integer width {width}: expected 1 to 8 bytes")]
    UnsupportedWidth { width: usize },
}

impl BundleError {
    /// Whether this error comes from the container framing itself
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            BundleError::TruncatedInput { .. } | BundleError::EntryLimitExceeded { .. }
        )
    }
}

/// Errors reported by the compression, transcoding and bitmap collaborators
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Codec task failed: {0}")]
    Task(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

#[cfg(feature = "image-codecs")]
impl From<image::ImageError> for CodecError {
    fn from(e: image::ImageError) -> Self {
        CodecError::Image(Box::new(e))
    }
}

/// A recoverable failure absorbed during decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Inflate failed; the payload was kept as raw bytes
    DeflateFallback { entry: String, reason: String },

    /// WebP to PNG transcode failed; the original WebP bytes were kept
    TranscodeFailure { entry: String, reason: String },
}

impl Degradation {
    /// Name of the entry the degradation happened on
    pub fn entry(&self) -> &str {
        match self {
            Degradation::DeflateFallback { entry, .. } => entry,
            Degradation::TranscodeFailure { entry, .. } => entry,
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::DeflateFallback { entry, reason } => {
                write!(f, "{}: inflate failed, kept raw bytes ({})", entry, reason)
            }
            Degradation::TranscodeFailure { entry, reason } => {
                write!(f, "{}: WebP transcode failed, kept original bytes ({})", entry, reason)
            }
        }
    }
}
