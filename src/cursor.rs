// SPDX-License-Identifier: MIT
//! Bounds-checked sequential reader over an immutable byte buffer

use crate::error::BundleError;

const MAX_UINT_WIDTH: usize = std::mem::size_of::<u64>();

/// Sequential big-endian reader
///
/// Every read either consumes exactly the requested bytes or fails with
/// `TruncatedInput` and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current offset from the start of the buffer
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Read `len` bytes as a borrowed slice
    #[inline]
    pub fn read_byte_slice(&mut self, len: usize) -> Result<&'a [u8], BundleError> {
        if len > self.remaining() {
            return Err(BundleError::TruncatedInput {
                offset: self.position,
                needed: len,
                remaining: self.remaining(),
            });
        }

        let start = self.position;
        self.position += len;
        Ok(&self.data[start..self.position])
    }

    /// Read a big-endian unsigned integer of `width` bytes (1..=8)
    ///
    /// Any other width fails with `UnsupportedWidth` before consuming input.
    pub fn read_fixed_width_uint(&mut self, width: usize) -> Result<u64, BundleError> {
        if !(1..=MAX_UINT_WIDTH).contains(&width) {
            return Err(BundleError::UnsupportedWidth { width });
        }

        let bytes = self.read_byte_slice(width)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    pub fn read_u16(&mut self) -> Result<u16, BundleError> {
        let bytes = self.read_byte_slice(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, BundleError> {
        let bytes = self.read_byte_slice(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read `len` bytes as text. Invalid UTF-8 sequences are replaced.
    pub fn read_text(&mut self, len: usize) -> Result<String, BundleError> {
        let bytes = self.read_byte_slice(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
