use image::imageops::FilterType;
use image::DynamicImage;

use crate::config::FeatureConfig;
use crate::{FeatureVector, SignalOrigin};

/// Dimension of the image feature vector under the default config:
/// 32 bins × 3 channels + 3 mean channel values.
pub const IMAGE_FEATURE_DIM: usize = 99;

/// Extract color-histogram features from raw image bytes.
///
/// On decode failure this returns an all-zero vector tagged
/// [`SignalOrigin::DecodeFallback`] instead of erroring; a missing visual
/// signal must never abort feature extraction. Callers that require decode to
/// succeed should go through [`crate::AcquiredImage`] first.
pub fn image_features(bytes: &[u8], cfg: &FeatureConfig) -> FeatureVector {
    match image::load_from_memory(bytes) {
        Ok(img) => FeatureVector::observed(image_features_decoded(&img, cfg)),
        Err(err) => {
            tracing::warn!(error = %err, "image decode failed, using zero feature vector");
            FeatureVector::zeroed(cfg.image_dim(), SignalOrigin::DecodeFallback)
        }
    }
}

/// Extract color-histogram features from an already decoded image.
///
/// The image is resized to the canonical resolution, then each RGB channel is
/// binned into `histogram_bins` buckets and independently normalized to sum
/// to 1. The 3 mean channel values (0–255 scale) are appended last.
pub fn image_features_decoded(img: &DynamicImage, cfg: &FeatureConfig) -> Vec<f32> {
    let resized = img
        .resize_exact(cfg.resize_width, cfg.resize_height, FilterType::Triangle)
        .to_rgb8();

    let bins = cfg.histogram_bins;
    let bucket = 256usize.div_ceil(bins);
    let mut histograms = vec![vec![0u32; bins]; 3];
    let mut sums = [0u64; 3];

    for pixel in resized.pixels() {
        for channel in 0..3 {
            let value = pixel.0[channel] as usize;
            histograms[channel][value / bucket] += 1;
            sums[channel] += value as u64;
        }
    }

    let pixel_count = (resized.width() * resized.height()) as f32;
    let mut features = Vec::with_capacity(cfg.image_dim());

    for hist in &histograms {
        let total: u32 = hist.iter().sum();
        // Each channel histogram counts every pixel exactly once, so `total`
        // only hits zero for a zero-area image.
        if total == 0 {
            features.extend(std::iter::repeat(0.0).take(bins));
        } else {
            features.extend(hist.iter().map(|&count| count as f32 / total as f32));
        }
    }

    for sum in sums {
        features.push(if pixel_count > 0.0 {
            sum as f32 / pixel_count
        } else {
            0.0
        });
    }

    features
}
