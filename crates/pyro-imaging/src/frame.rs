//! Canonical decoded pixel buffer.

use std::path::Path;

use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::error::{DecodeError, ImagingResult};

/// An immutable decoded image, owned by the request that decoded it.
///
/// Decoding happens once; every detector reads the same buffer. Nothing
/// hands out mutable access, so concurrent detector invocations against one
/// frame are safe by construction.
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: RgbImage,
    byte_len: usize,
}

impl Frame {
    /// Decode upload bytes into a canonical 3-channel RGB buffer.
    ///
    /// Accepts any format the `image` crate recognizes (JPEG and PNG at
    /// minimum). Zero-length and non-image payloads are rejected with
    /// distinguishable errors.
    pub fn decode(raw: &[u8]) -> ImagingResult<Self> {
        if raw.is_empty() {
            return Err(DecodeError::Empty);
        }

        let format = image::guess_format(raw).map_err(|_| DecodeError::UnknownFormat)?;
        let decoded = image::load_from_memory_with_format(raw, format)?;
        let pixels = decoded.to_rgb8();

        debug!(
            width = pixels.width(),
            height = pixels.height(),
            bytes = raw.len(),
            format = ?format,
            "Decoded upload"
        );

        Ok(Self {
            pixels,
            byte_len: raw.len(),
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Original encoded payload length in bytes.
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Read-only view of the decoded pixels.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Write the frame as PNG, used to spool input for backends that score
    /// from a file path.
    pub fn write_png(&self, path: &Path) -> ImagingResult<()> {
        self.pixels
            .save_with_format(path, ImageFormat::Png)
            .map_err(DecodeError::from)
    }
}
