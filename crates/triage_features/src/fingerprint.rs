use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bit width of an [`ImageFingerprint`]; also the Hamming-distance
/// normalization denominator.
pub const FINGERPRINT_BITS: u32 = 64;

/// Edge length of the thumbnail the average hash is computed over.
const HASH_EDGE: u32 = 8;

/// A 64-bit average-hash perceptual fingerprint.
///
/// Computed by collapsing the image to an 8×8 grayscale thumbnail and setting
/// one bit per pixel above the thumbnail mean. Tolerant to resizing and
/// recompression, sensitive to structural content change. Fingerprints are
/// compared only by Hamming distance, never for exact identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageFingerprint(u64);

/// The input could not be decoded into pixels, so no fingerprint exists.
///
/// Deliberately a distinct error rather than a default hash: a silent default
/// would make every undecodable image "similar" to every other one.
#[derive(Debug, Error)]
#[error("unhashable image: {0}")]
pub struct FingerprintError(#[from] image::ImageError);

impl ImageFingerprint {
    /// Hash an already decoded image. Infallible: any pixel data hashes.
    pub fn of_image(img: &DynamicImage) -> Self {
        let thumb = img
            .grayscale()
            .resize_exact(HASH_EDGE, HASH_EDGE, FilterType::Triangle)
            .to_luma8();

        let total: u32 = thumb.pixels().map(|p| p.0[0] as u32).sum();
        let mean = total as f64 / (HASH_EDGE * HASH_EDGE) as f64;

        let mut bits = 0u64;
        for (i, pixel) in thumb.pixels().enumerate() {
            if pixel.0[0] as f64 > mean {
                bits |= 1 << i;
            }
        }
        Self(bits)
    }

    /// Hash raw image bytes, failing distinguishably on decode failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FingerprintError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::of_image(&img))
    }

    /// Reconstruct a fingerprint from its raw bit pattern.
    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Number of differing bits between two fingerprints.
    pub fn hamming(self, other: Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Similarity in [0, 1]: `1 − hamming / 64`. 1.0 means bit-identical,
    /// 0.0 means every bit differs.
    pub fn similarity(self, other: Self) -> f64 {
        1.0 - self.hamming(other) as f64 / FINGERPRINT_BITS as f64
    }
}

impl std::fmt::Display for ImageFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 255) / width.max(1)) as u8;
            Rgb([v, v / 2, (y % 256) as u8])
        }))
    }

    #[test]
    fn identical_image_similarity_is_exactly_one() {
        let fp = ImageFingerprint::of_image(&gradient(100, 80));
        assert_eq!(fp.hamming(fp), 0);
        assert_eq!(fp.similarity(fp), 1.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = ImageFingerprint::of_image(&gradient(100, 80));
        let b = ImageFingerprint::of_image(&gradient(80, 100).rotate90());
        assert_eq!(a.similarity(b), b.similarity(a));
    }

    #[test]
    fn survives_resizing() {
        let original = gradient(256, 256);
        let resized = original.resize_exact(96, 96, FilterType::Triangle);
        let a = ImageFingerprint::of_image(&original);
        let b = ImageFingerprint::of_image(&resized);
        assert!(
            a.similarity(b) > 0.9,
            "resize changed too many bits: {}",
            a.similarity(b)
        );
    }

    #[test]
    fn structural_change_moves_the_hash() {
        let a = ImageFingerprint::of_image(&gradient(128, 128));
        let b = ImageFingerprint::of_image(&gradient(128, 128).fliph());
        assert!(a.similarity(b) < 1.0);
    }

    #[test]
    fn undecodable_bytes_are_a_distinct_error() {
        assert!(ImageFingerprint::from_bytes(b"garbage").is_err());
    }

    #[test]
    fn bytes_roundtrip_matches_decoded_hash() {
        let img = gradient(64, 64);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode");

        let from_bytes = ImageFingerprint::from_bytes(&out.into_inner()).expect("hash");
        assert_eq!(from_bytes, ImageFingerprint::of_image(&img));
    }
}
