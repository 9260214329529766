//! Request-scoped image spooling for path-based backends.
//!
//! The shipped ONNX backends score from in-memory tensors and do not use
//! this; it is the supported way for embedders to wire a backend whose
//! scoring function only accepts a file path, without reintroducing a
//! shared fixed filename that races under concurrent requests.

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use pyro_imaging::Frame;

use crate::error::{InferenceError, InferenceResult};

/// A frame written to a uniquely named temporary PNG.
///
/// Some trained backends can only score from a file path. Each invocation
/// gets its own spool so concurrent requests never collide on a shared
/// filename, and the file is removed on every exit path when the spool
/// drops.
pub struct SpooledFrame {
    file: NamedTempFile,
}

impl SpooledFrame {
    pub fn create(frame: &Frame) -> InferenceResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("pyrowatch-")
            .suffix(".png")
            .tempfile()?;

        frame
            .write_png(file.path())
            .map_err(|e| InferenceError::backend(format!("Failed to spool frame: {e}")))?;

        debug!(path = %file.path().display(), "Spooled frame for path-based backend");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn test_frame() -> Frame {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        Frame::decode(&buf.into_inner()).unwrap()
    }

    #[test]
    fn test_spool_removed_on_drop() {
        let frame = test_frame();
        let path: PathBuf;
        {
            let spool = SpooledFrame::create(&frame).unwrap();
            path = spool.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_spools_get_unique_paths() {
        let frame = test_frame();
        let a = SpooledFrame::create(&frame).unwrap();
        let b = SpooledFrame::create(&frame).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().exists());
        assert!(b.path().exists());
    }

    #[test]
    fn test_spooled_file_is_decodable() {
        let frame = test_frame();
        let spool = SpooledFrame::create(&frame).unwrap();
        let bytes = std::fs::read(spool.path()).unwrap();
        let reread = Frame::decode(&bytes).unwrap();
        assert_eq!(reread.width(), 4);
    }
}
