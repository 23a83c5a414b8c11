// SPDX-License-Identifier: MIT
//! Bundle reader: container framing and the per-entry decode pipeline
//!
//! ```text
//! entryCount   u16
//! repeated entryCount times:
//!   nameLength    u16
//!   name          nameLength bytes
//!   payloadLength u32
//!   payload       payloadLength bytes
//! ```
//!
//! Each payload goes through the compression sniffer, the asset classifier
//! and, for images, the normalizer and bitmap loader. Entries are processed
//! strictly in container order; later entries overwrite earlier ones of the
//! same category.

use std::borrow::Cow;
use std::sync::Arc;

use crate::asset::{classify, descriptor_text, AssetKind, ImageSignature};
use crate::bitmap::BitmapLoader;
use crate::bundle::{DecodedImage, ParsedBundle};
use crate::compression::{BlobDecoder, CompressionKind, DecodedBlob, Decompressor};
use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::error::{BundleError, Degradation};
use crate::format::{has_zstd_magic, WEBP_SIGNATURE_LEN};
use crate::normalizer::{materialize, ImageNormalizer};

/// One framed entry, borrowed from the container buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry<'a> {
    pub name: String,
    /// Payload length as declared in the entry header
    pub declared_length: u32,
    pub payload: &'a [u8],
}

/// Iterator over the framed entries of a container
///
/// Reads the entry count on the first call to `next`. Any read failure is
/// yielded once and ends the iteration; there is no resynchronization.
#[derive(Debug, Clone)]
pub struct EntryIter<'a> {
    cursor: ByteCursor<'a>,
    remaining: Option<u16>,
    limit: u16,
    finished: bool,
}

impl<'a> EntryIter<'a> {
    pub fn new(container: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(container),
            remaining: None,
            limit: u16::MAX,
            finished: false,
        }
    }

    /// Reject containers declaring more than `limit` entries
    pub fn with_limit(mut self, limit: u16) -> Self {
        self.limit = limit;
        self
    }

    /// Entries still to be read, once the count is known
    pub fn remaining(&self) -> Option<u16> {
        self.remaining
    }

    /// Bytes after the last entry (only meaningful once iteration is done)
    pub fn trailing_bytes(&self) -> usize {
        self.cursor.remaining()
    }

    fn read_count(&mut self) -> Result<u16, BundleError> {
        let declared = self.cursor.read_u16()?;
        if declared > self.limit {
            return Err(BundleError::EntryLimitExceeded {
                declared,
                limit: self.limit,
            });
        }
        Ok(declared)
    }

    fn read_entry(&mut self) -> Result<BundleEntry<'a>, BundleError> {
        let name_length = self.cursor.read_u16()?;
        let name = self.cursor.read_text(name_length as usize)?;
        let declared_length = self.cursor.read_u32()?;
        let payload = self.cursor.read_byte_slice(declared_length as usize)?;

        Ok(BundleEntry {
            name,
            declared_length,
            payload,
        })
    }
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = Result<BundleEntry<'a>, BundleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let remaining = match self.remaining {
            Some(n) => n,
            None => match self.read_count() {
                Ok(n) => {
                    self.remaining = Some(n);
                    n
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            },
        };

        if remaining == 0 {
            self.finished = true;
            return None;
        }

        match self.read_entry() {
            Ok(entry) => {
                self.remaining = Some(remaining - 1);
                Some(Ok(entry))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Strip an outer zstd envelope from the whole container, if present
pub fn unwrap_envelope<'a>(
    buffer: &'a [u8],
    zstd: &dyn Decompressor,
) -> Result<Cow<'a, [u8]>, BundleError> {
    if !has_zstd_magic(buffer) {
        return Ok(Cow::Borrowed(buffer));
    }

    let container = zstd
        .decompress(buffer)
        .map_err(|source| BundleError::MalformedCompression {
            context: "outer envelope".to_string(),
            source,
        })?;

    tracing::debug!(
        compressed = buffer.len(),
        decompressed = container.len(),
        "Unwrapped outer zstd envelope"
    );

    Ok(Cow::Owned(container))
}

/// Per-entry diagnostics produced by `BundleDecoder::inspect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub name: String,
    pub declared_length: u32,
    pub compression: CompressionKind,
    pub decompressed_length: usize,
    /// First bytes of the decompressed payload
    pub head: Vec<u8>,
    /// Image signature; `None` for descriptor entries
    pub signature: Option<ImageSignature>,
    pub inflate_error: Option<String>,
}

/// Container-level diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub input_length: usize,
    pub outer_envelope: bool,
    pub container_length: usize,
    pub entries: Vec<EntryReport>,
    pub trailing_bytes: usize,
}

/// Decodes bundles using injected collaborators
#[derive(Clone)]
pub struct BundleDecoder {
    blobs: BlobDecoder,
    normalizer: ImageNormalizer,
    loader: Arc<dyn BitmapLoader>,
    config: DecoderConfig,
}

impl BundleDecoder {
    pub fn new(
        blobs: BlobDecoder,
        normalizer: ImageNormalizer,
        loader: Arc<dyn BitmapLoader>,
    ) -> Self {
        Self {
            blobs,
            normalizer,
            loader,
            config: DecoderConfig::default(),
        }
    }

    /// Decoder using the zstd, zlib and `image` backed collaborators
    #[cfg(feature = "image-codecs")]
    pub fn with_default_codecs() -> Self {
        use crate::bitmap::ImageBitmapLoader;
        use crate::normalizer::WebpToPngTranscoder;

        Self::new(
            BlobDecoder::default(),
            ImageNormalizer::new(Arc::new(WebpToPngTranscoder)),
            Arc::new(ImageBitmapLoader),
        )
    }

    /// Apply a configuration
    ///
    /// Disabling `transcode_webp` replaces the normalizer with a passthrough.
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        if !config.transcode_webp {
            self.normalizer = ImageNormalizer::passthrough();
        }
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn container<'a>(&self, buffer: &'a [u8]) -> Result<Cow<'a, [u8]>, BundleError> {
        if self.config.unwrap_envelope {
            unwrap_envelope(buffer, self.blobs.zstd())
        } else {
            Ok(Cow::Borrowed(buffer))
        }
    }

    fn decode_payload(&self, entry: &BundleEntry<'_>) -> Result<DecodedBlob, BundleError> {
        self.blobs
            .decode(entry.payload)
            .map_err(|source| BundleError::MalformedCompression {
                context: entry.name.clone(),
                source,
            })
    }

    /// Decode a bundle into its descriptor and bitmap
    ///
    /// All-or-nothing: any fatal error discards everything decoded so far.
    pub async fn decode(&self, buffer: &[u8]) -> Result<ParsedBundle, BundleError> {
        let container = self.container(buffer)?;
        let entries = EntryIter::new(&container).with_limit(self.config.max_entries);

        let mut descriptor = None;
        let mut image = None;
        let mut diagnostics = Vec::new();
        let mut entry_count = 0;

        for entry in entries {
            let entry = entry?;
            let blob = self.decode_payload(&entry)?;

            tracing::debug!(
                entry = %entry.name,
                declared = entry.declared_length,
                compression = %blob.kind,
                decompressed = blob.bytes.len(),
                "Dispatching entry"
            );

            if let Some(reason) = blob.inflate_error {
                tracing::warn!(entry = %entry.name, %reason, "Inflate failed, treating payload as raw");
                diagnostics.push(Degradation::DeflateFallback {
                    entry: entry.name.clone(),
                    reason,
                });
            }

            match classify(&entry.name, &blob.bytes) {
                AssetKind::Descriptor => {
                    let value: serde_json::Value =
                        serde_json::from_str(&descriptor_text(&blob.bytes)).map_err(|source| {
                            BundleError::JsonParse {
                                name: entry.name.clone(),
                                source,
                            }
                        })?;
                    descriptor = Some(value);
                }
                AssetKind::Image(signature) => {
                    let normalized = self
                        .normalizer
                        .normalize(&entry.name, blob.bytes, signature)
                        .await;

                    if let Some(reason) = normalized.transcode_error.clone() {
                        diagnostics.push(Degradation::TranscodeFailure {
                            entry: entry.name.clone(),
                            reason,
                        });
                    }

                    let bitmap = materialize(self.loader.as_ref(), &entry.name, &normalized).await?;
                    image = Some(DecodedImage {
                        name: entry.name,
                        canonical_bytes: normalized.bytes,
                        bitmap,
                    });
                }
            }

            entry_count += 1;
        }

        tracing::info!(
            entries = entry_count,
            has_descriptor = descriptor.is_some(),
            has_image = image.is_some(),
            degraded = diagnostics.len(),
            "Decoded bundle"
        );

        Ok(ParsedBundle {
            descriptor,
            image,
            entry_count,
            diagnostics,
        })
    }

    /// Walk the container and report on each entry without transcoding,
    /// parsing descriptors or materializing bitmaps
    pub fn inspect(&self, buffer: &[u8]) -> Result<InspectReport, BundleError> {
        let container = self.container(buffer)?;
        let outer_envelope = matches!(container, Cow::Owned(_));
        let mut entries = EntryIter::new(&container).with_limit(self.config.max_entries);
        let mut reports = Vec::new();

        for entry in entries.by_ref() {
            let entry = entry?;
            let blob = self.decode_payload(&entry)?;
            let head_len = blob.bytes.len().min(WEBP_SIGNATURE_LEN);

            let signature = match classify(&entry.name, &blob.bytes) {
                AssetKind::Descriptor => None,
                AssetKind::Image(signature) => Some(signature),
            };

            reports.push(EntryReport {
                declared_length: entry.declared_length,
                compression: blob.kind,
                decompressed_length: blob.bytes.len(),
                head: blob.bytes[..head_len].to_vec(),
                signature,
                inflate_error: blob.inflate_error,
                name: entry.name,
            });
        }

        Ok(InspectReport {
            input_length: buffer.len(),
            outer_envelope,
            container_length: container.len(),
            entries: reports,
            trailing_bytes: entries.trailing_bytes(),
        })
    }
}

impl std::fmt::Debug for BundleDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleDecoder")
            .field("normalizer", &self.normalizer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Decode a bundle with the default collaborators
#[cfg(feature = "image-codecs")]
pub async fn decode_bundle(buffer: &[u8]) -> Result<ParsedBundle, BundleError> {
    BundleDecoder::with_default_codecs().decode(buffer).await
}
