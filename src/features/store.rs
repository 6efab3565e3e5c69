//! 特徴ストアモジュール
//!
//! 画像ごとの記述子をSHA-256ハッシュ付きで永続化し、
//! 内容が変わっていない画像の再抽出をスキップする。

use crate::error::{BofSearchError, Result};
use super::Descriptor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// 特徴ストアの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStore {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 生成日時
    generated_at: String,
    /// ファイル名 → エントリのマップ
    entries: BTreeMap<String, FeatureEntry>,
}

/// 特徴ストアのエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureEntry {
    /// ファイル内容のSHA-256
    pub content_hash: String,
    /// 128次元記述子の列
    pub descriptors: Vec<Descriptor>,
}

impl FeatureStore {
    const CURRENT_VERSION: u32 = 1;

    /// ストアを読み込み。壊れている・バージョン不一致なら空として扱う
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, FeatureStore>(reader) {
            Ok(store) => {
                // バージョンチェック
                if store.version != Self::CURRENT_VERSION {
                    eprintln!("特徴ストアのバージョン不一致、再生成します");
                    return Self::default();
                }
                store
            }
            Err(_) => Self::default(),
        }
    }

    /// ストアを読み込み。後続ステージ用（存在しなければエラー）
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BofSearchError::MissingFeatureStore);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let store: FeatureStore = serde_json::from_reader(reader)?;

        if store.version != Self::CURRENT_VERSION {
            return Err(BofSearchError::ArtifactFormat(format!(
                "特徴ストアのバージョンが不正: {} (期待: {})",
                store.version,
                Self::CURRENT_VERSION
            )));
        }

        Ok(store)
    }

    /// ストアを保存
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// 内容ハッシュが一致するエントリを引く
    pub fn get_if_unchanged(&self, file_name: &str, content_hash: &str) -> Option<&FeatureEntry> {
        self.entries
            .get(file_name)
            .filter(|e| e.content_hash == content_hash)
    }

    /// エントリを追加（同名は上書き）
    pub fn insert(&mut self, file_name: String, content_hash: String, descriptors: Vec<Descriptor>) {
        self.entries.insert(
            file_name,
            FeatureEntry {
                content_hash,
                descriptors,
            },
        );
    }

    /// スキャン結果に存在しないエントリを落とす
    pub fn retain_files(&mut self, keep: &HashSet<String>) {
        self.entries.retain(|name, _| keep.contains(name));
    }

    /// ファイル名順のイテレータ
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureEntry)> {
        self.entries.iter()
    }

    /// エントリ件数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 生成日時を現在時刻にする
    pub fn touch(&mut self) {
        self.generated_at = chrono::Local::now().to_rfc3339();
    }

    /// 生成日時
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            generated_at: chrono::Local::now().to_rfc3339(),
            entries: BTreeMap::new(),
        }
    }
}

/// 画像ファイルのSHA-256ハッシュを計算
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
