mod patch;
pub mod store;

pub use patch::{extract_descriptors, Descriptor, DESCRIPTOR_DIM};
pub use store::{compute_file_hash, FeatureStore};

use crate::error::{BofSearchError, Result};
use std::path::Path;

/// 画像ファイルから記述子を抽出する
pub fn extract_from_path(path: &Path, max_features: usize) -> Result<Vec<Descriptor>> {
    let image = image::open(path)
        .map_err(|e| BofSearchError::ImageLoad(format!("{}: {}", path.display(), e)))?;
    Ok(extract_descriptors(&image, max_features))
}
