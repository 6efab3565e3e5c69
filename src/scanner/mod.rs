//! 画像フォルダのスキャン
//!
//! インデックス対象の画像を列挙する。結果はファイル名順なので
//! 同じフォルダからは常に同じ並びが得られる。

use crate::error::{BofSearchError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// スキャンで見つかった1画像
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// 拡張子が対応画像形式かどうか（大文字小文字は区別しない）
fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .map_or(false, |ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|&supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// フォルダ直下の画像ファイルをファイル名順に列挙する
///
/// サブフォルダは見ない。画像が1枚もなければ空のVecを返す。
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(BofSearchError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_image_file(entry.path()))
        .filter_map(|entry| {
            let file_name = entry.file_name().to_str()?.to_string();
            Some(ImageInfo {
                path: entry.path().to_path_buf(),
                file_name,
            })
        })
        .collect();

    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}
