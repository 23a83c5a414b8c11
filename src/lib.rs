// SPDX-License-Identifier: MIT
//! # Nitro Bundle
//!
//! Decoder for Nitro asset bundles: a small binary container holding a JSON
//! descriptor and a single image asset, each entry optionally compressed.
//!
//! ## Format Overview
//!
//! ```text
//! Nitro bundle (big-endian)
//! =========================
//!
//! [optional outer zstd frame around everything below]
//!
//! entryCount       u16
//! per entry:
//!   nameLength     u16
//!   name           nameLength bytes (UTF-8)
//!   payloadLength  u32
//!   payload        payloadLength bytes (zstd frame, zlib stream or raw)
//! ```
//!
//! Entries whose name ends in `.json` are parsed as the descriptor. Every
//! other entry is an image: WebP is transcoded to PNG, PNG and unknown
//! formats pass through, and the result is materialized into a [`Bitmap`].
//!
//! ## Failure Policy
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | Framing read past end of buffer | fatal `TruncatedInput` |
//! | zstd magic present but frame invalid | fatal `MalformedCompression` |
//! | zlib inflate fails | payload kept raw, `DeflateFallback` diagnostic |
//! | WebP transcode fails | WebP kept, `TranscodeFailure` diagnostic |
//! | Descriptor is not JSON | fatal `JsonParse` |
//! | Bitmap loader fails | fatal `Materialization` |
//!
//! Decoding is all-or-nothing: a fatal error yields no partial bundle.
//!
//! ## Usage
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use nitro_bundle::{BundleDecoder, DecoderConfig};
//!
//! let data = std::fs::read("hh_human_50_body.nitro")?;
//! let decoder = BundleDecoder::with_default_codecs().with_config(DecoderConfig::from_env());
//! let bundle = decoder.decode(&data).await?;
//!
//! if let Some(bitmap) = bundle.bitmap() {
//!     println!("{}x{}", bitmap.width(), bitmap.height());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The compression, transcoding and bitmap collaborators are traits
//! ([`Decompressor`], [`ImageTranscoder`], [`BitmapLoader`]) so callers can
//! supply their own implementations.

pub mod asset;
pub mod bitmap;
pub mod bundle;
pub mod compression;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod normalizer;
pub mod reader;

// Re-export main types
pub use asset::{classify, AssetKind, ImageSignature};
pub use bitmap::{Bitmap, BitmapLoader};
pub use bundle::{DecodedImage, ParsedBundle};
pub use compression::{
    BlobDecoder, CompressionKind, DecodedBlob, Decompressor, ZlibInflater, ZstdDecompressor,
};
pub use config::{ConfigOverrides, DecoderConfig};
pub use cursor::ByteCursor;
pub use error::{BundleError, CodecError, Degradation};
pub use normalizer::{ImageNormalizer, ImageTranscoder, NormalizedImage};
pub use reader::{BundleDecoder, BundleEntry, EntryIter, EntryReport, InspectReport};

#[cfg(feature = "image-codecs")]
pub use bitmap::ImageBitmapLoader;
#[cfg(feature = "image-codecs")]
pub use normalizer::WebpToPngTranscoder;
#[cfg(feature = "image-codecs")]
pub use reader::decode_bundle;
