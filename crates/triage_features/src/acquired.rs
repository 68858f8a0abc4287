use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// A submission image resolved to one decoded instance.
///
/// Acquisition (download or file read) happens before the triage pipeline
/// starts; every analyzer stage borrows the same `AcquiredImage` so the four
/// verdicts are always about the same pixels. The raw bytes are kept alongside
/// the decoded image because EXIF metadata lives in the container, not in the
/// pixel data.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    bytes: Vec<u8>,
    decoded: DynamicImage,
    format: Option<ImageFormat>,
}

/// Image bytes could not be decoded. Fatal for the whole submission: the
/// pipeline never starts on an image it cannot see.
#[derive(Debug, Error)]
#[error("image decode failed: {0}")]
pub struct DecodeError(#[from] image::ImageError);

impl AcquiredImage {
    /// Decode `bytes` into a usable image, remembering the detected container
    /// format.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        let format = image::guess_format(&bytes).ok();
        let decoded = image::load_from_memory(&bytes)?;
        Ok(Self {
            bytes,
            decoded,
            format,
        })
    }

    /// Raw container bytes as received.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The decoded pixel data shared by all pipeline stages.
    pub fn decoded(&self) -> &DynamicImage {
        &self.decoded
    }

    /// Container format detected from the byte signature, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// Decoded resolution in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoded.width(), self.decoded.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .expect("png encode");
        out.into_inner()
    }

    #[test]
    fn decodes_png_and_detects_format() {
        let acquired = AcquiredImage::from_bytes(png_bytes(64, 48)).expect("decode");
        assert_eq!(acquired.dimensions(), (64, 48));
        assert_eq!(acquired.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = AcquiredImage::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(result.is_err());
    }
}
