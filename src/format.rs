// SPDX-License-Identifier: MIT
//! Nitro bundle wire format
//!
//! Defines the framing constants and format signatures used by the decoder.

/// Zstandard frame magic bytes (little-endian 0xFD2FB528)
pub const ZSTD_MAGIC: &[u8; 4] = &[0x28, 0xB5, 0x2F, 0xFD];

/// PNG signature prefix ("\x89PNG")
pub const PNG_MAGIC: &[u8; 4] = &[0x89, 0x50, 0x4E, 0x47];

/// RIFF container tag at bytes 0..4 of a WebP file
pub const RIFF_TAG: &[u8; 4] = b"RIFF";

/// WebP form type at bytes 8..12 of a WebP file
pub const WEBP_TAG: &[u8; 4] = b"WEBP";

/// Offset of the RIFF form type within a RIFF file
pub const RIFF_FORM_OFFSET: usize = 8;

/// Minimum length for a buffer to carry a full RIFF/WEBP signature
pub const WEBP_SIGNATURE_LEN: usize = RIFF_FORM_OFFSET + WEBP_TAG.len();

/// Entry names ending with this suffix hold the JSON descriptor
pub const DESCRIPTOR_SUFFIX: &str = ".json";

/// UTF-8 byte order mark, dropped from the start of descriptor text
pub const UTF8_BOM: &[u8; 3] = &[0xEF, 0xBB, 0xBF];

/// Field widths (all big-endian)
pub mod width {
    /// Entry count at the start of the container
    pub const ENTRY_COUNT: usize = 2;

    /// Length prefix of each entry name
    pub const NAME_LENGTH: usize = 2;

    /// Length prefix of each entry payload
    pub const PAYLOAD_LENGTH: usize = 4;
}

/// Returns true if `data` starts with the zstd frame magic.
///
/// Only the first four bytes are inspected.
#[inline]
pub fn has_zstd_magic(data: &[u8]) -> bool {
    data.len() >= ZSTD_MAGIC.len() && data[..ZSTD_MAGIC.len()] == ZSTD_MAGIC[..]
}
