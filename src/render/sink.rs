use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::compositor::ThumbnailImage;
use crate::error::{Result, ThumbnailError};

/// Encodes a finished thumbnail somewhere.
pub trait ImageSink {
    fn write_image(&mut self, image: &ThumbnailImage) -> Result<()>;
}

fn sink_error(err: impl std::error::Error + Send + Sync + 'static) -> ThumbnailError {
    ThumbnailError::SinkWriteFailure(Box::new(err))
}

/// Writes a PNG file. The file is only created once encoding succeeded.
pub struct PngFileSink {
    path: PathBuf,
}

impl PngFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for PngFileSink {
    fn write_image(&mut self, image: &ThumbnailImage) -> Result<()> {
        let mut encoded = PngMemorySink::default();
        encoded.write_image(image)?;
        std::fs::write(&self.path, encoded.bytes()).map_err(sink_error)?;
        log::info!(
            "Wrote {}x{} thumbnail to {}",
            image.width(),
            image.height(),
            self.path.display()
        );
        Ok(())
    }
}

/// Keeps the encoded PNG bytes in memory.
#[derive(Default)]
pub struct PngMemorySink {
    bytes: Vec<u8>,
}

impl PngMemorySink {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl ImageSink for PngMemorySink {
    fn write_image(&mut self, image: &ThumbnailImage) -> Result<()> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .as_rgb_image()
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(sink_error)?;
        self.bytes = cursor.into_inner();
        Ok(())
    }
}
