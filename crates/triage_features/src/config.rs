use serde::{Deserialize, Serialize};

/// Configuration for image feature extraction.
///
/// The canonical resolution makes histograms resolution-invariant: every image
/// is resized to `resize_width × resize_height` before binning, so a phone
/// photo and its recompressed thumbnail land in comparable feature space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Canonical width images are resized to before histogram extraction.
    pub resize_width: u32,
    /// Canonical height images are resized to before histogram extraction.
    pub resize_height: u32,
    /// Histogram bins per color channel.
    pub histogram_bins: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            resize_width: 128,
            resize_height: 128,
            histogram_bins: 32,
        }
    }
}

impl FeatureConfig {
    /// Total dimension of the image feature vector this config produces:
    /// `bins` per channel over 3 channels, plus 3 mean channel values.
    pub fn image_dim(&self) -> usize {
        self.histogram_bins * 3 + 3
    }
}
