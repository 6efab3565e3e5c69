use crate::error::{BofSearchError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 検索対象の画像フォルダ
    pub images_dir: PathBuf,
    /// アップロード画像の保存先
    pub upload_dir: PathBuf,
    /// アーティファクト（特徴・辞書・インデックス）の保存先
    pub data_dir: PathBuf,
    pub vocabulary_size: usize,
    pub max_features: usize,
    pub samples_per_image: usize,
    pub kmeans_batch_size: usize,
    pub kmeans_iterations: usize,
    pub kmeans_seed: u64,
    pub top_k: usize,
    pub server_port: u16,
    pub cors_origin: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| BofSearchError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("bof-search").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            images_dir: PathBuf::from("images"),
            upload_dir: PathBuf::from("uploads"),
            data_dir: PathBuf::from("data"),
            vocabulary_size: 700,    // 視覚語彙のサイズ
            max_features: 2000,      // 1画像あたりの特徴点上限
            samples_per_image: 200,  // 辞書学習に使う1画像あたりの記述子数
            kmeans_batch_size: 2000,
            kmeans_iterations: 100,
            kmeans_seed: 42,
            top_k: 10,
            server_port: 8000,
            cors_origin: "http://localhost:5173".into(),
        }
    }

    /// 特徴ストアのパス
    pub fn descriptors_path(&self) -> PathBuf {
        self.data_dir.join("descriptors.json")
    }

    /// 視覚辞書のパス
    pub fn vocabulary_path(&self) -> PathBuf {
        self.data_dir.join("vocabulary.json")
    }

    /// BoWインデックスのパス
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("bow_index.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
