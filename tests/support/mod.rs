// SPDX-License-Identifier: MIT
//! Shared fixtures for integration and property tests
//!
//! Bundles are only ever written here; the crate itself has no writer.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nitro_bundle::{
    Bitmap, BitmapLoader, BlobDecoder, BundleDecoder, CodecError, ImageNormalizer,
    ImageTranscoder,
};

/// How a fixture entry payload is stored
#[derive(Debug, Clone, Copy)]
pub enum Packing {
    Raw,
    Zlib,
    Zstd,
}

pub fn zlib_stream(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn zstd_frame(data: &[u8]) -> Vec<u8> {
    zstd::stream::encode_all(data, 3).unwrap()
}

pub fn pack(data: &[u8], packing: Packing) -> Vec<u8> {
    match packing {
        Packing::Raw => data.to_vec(),
        Packing::Zlib => zlib_stream(data),
        Packing::Zstd => zstd_frame(data),
    }
}

/// Test-only bundle writer
#[derive(Debug, Default, Clone)]
pub struct BundleBuilder {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    declared_count: Option<u16>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: &str, data: &[u8], packing: Packing) -> Self {
        self.entries
            .push((name.as_bytes().to_vec(), pack(data, packing)));
        self
    }

    pub fn raw_entry(mut self, name: &[u8], payload: Vec<u8>) -> Self {
        self.entries.push((name.to_vec(), payload));
        self
    }

    /// Override the entry count written in the header
    pub fn declare_count(mut self, count: u16) -> Self {
        self.declared_count = Some(count);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let count = self
            .declared_count
            .unwrap_or(self.entries.len() as u16);
        let mut out = count.to_be_bytes().to_vec();
        for (name, payload) in &self.entries {
            out.extend_from_slice(&(name.len() as u16).to_be_bytes());
            out.extend_from_slice(name);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    /// Whole container wrapped in an outer zstd frame
    pub fn build_enveloped(&self) -> Vec<u8> {
        zstd_frame(&self.build())
    }
}

#[cfg(feature = "image-codecs")]
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(width, height, image::ImageFormat::Png)
}

#[cfg(feature = "image-codecs")]
pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_fixture(width, height, image::ImageFormat::WebP)
}

#[cfg(feature = "image-codecs")]
fn encode_fixture(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 128, 255])
    });
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}

/// Loader that records every request and returns a 1x1 bitmap
#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub requests: Mutex<Vec<String>>,
}

#[async_trait]
impl BitmapLoader for RecordingLoader {
    async fn materialize(&self, base64_png: &str) -> Result<Bitmap, CodecError> {
        self.requests.lock().unwrap().push(base64_png.to_string());
        Ok(Bitmap::from_rgba(1, 1, vec![0; 4]).unwrap())
    }
}

/// Loader that always fails
#[derive(Debug, Default)]
pub struct RejectingLoader;

#[async_trait]
impl BitmapLoader for RejectingLoader {
    async fn materialize(&self, _base64_png: &str) -> Result<Bitmap, CodecError> {
        Err(CodecError::Unsupported("loader rejects everything".to_string()))
    }
}

/// Transcoder that always fails and counts its calls
#[derive(Debug, Default)]
pub struct FailingTranscoder {
    pub calls: AtomicUsize,
}

impl FailingTranscoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageTranscoder for FailingTranscoder {
    async fn transcode_webp_to_png(&self, _webp: &[u8]) -> Result<Vec<u8>, CodecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CodecError::Unsupported("transcoder unavailable".to_string()))
    }
}

/// Decoder with real decompression and the given transcoder/loader
pub fn decoder_with(
    transcoder: Arc<dyn ImageTranscoder>,
    loader: Arc<dyn BitmapLoader>,
) -> BundleDecoder {
    BundleDecoder::new(
        BlobDecoder::default(),
        ImageNormalizer::new(transcoder),
        loader,
    )
}
