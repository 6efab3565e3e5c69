//! BoWインデックスモジュール
//!
//! 特徴ストアの全記述子を視覚語に割り当て、画像ごとの
//! TF-IDFベクトルとIDFベクトルを1つのアーティファクトに永続化する。

use crate::error::{BofSearchError, Result};
use crate::features::FeatureStore;
use crate::vocabulary::Vocabulary;
use bof_search_common::{idf, l1_normalize, term_histogram, tf_idf};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// BoWインデックス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BowIndex {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 生成日時
    generated_at: String,
    /// 生成に使った辞書のサイズ
    vocabulary_size: usize,
    /// 視覚語ごとのIDF
    idf: Vec<f32>,
    /// 画像ごとのTF-IDFベクトル（ファイル名順）
    entries: Vec<IndexEntry>,
}

/// インデックスのエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub file_name: String,
    /// L2正規化済みTF-IDFベクトル
    pub vector: Vec<f32>,
}

impl BowIndex {
    const CURRENT_VERSION: u32 = 1;

    /// 特徴ストアと辞書からインデックスを構築する
    pub fn build(store: &FeatureStore, vocabulary: &Vocabulary) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(bof_search_common::Error::EmptyVocabulary.into());
        }
        if store.is_empty() {
            return Err(BofSearchError::NoFeatures("特徴ストアが空です".into()));
        }

        let k = vocabulary.len();

        let mut histograms: Vec<(String, Vec<f32>)> = Vec::with_capacity(store.len());
        for (file_name, entry) in store.iter() {
            let assignments = vocabulary.assign_all(&entry.descriptors);
            let mut histogram = term_histogram(&assignments, k)?;
            l1_normalize(&mut histogram);
            histograms.push((file_name.clone(), histogram));
        }

        // 文書頻度: その視覚語が1回でも出た画像の数
        let mut document_frequency = vec![0u32; k];
        for (_, histogram) in &histograms {
            for (word, &value) in histogram.iter().enumerate() {
                if value > 0.0 {
                    document_frequency[word] += 1;
                }
            }
        }
        let idf = idf(&document_frequency, histograms.len());

        let entries = histograms
            .into_iter()
            .map(|(file_name, histogram)| -> Result<IndexEntry> {
                let vector = tf_idf(&histogram, &idf)?;
                Ok(IndexEntry { file_name, vector })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: Self::CURRENT_VERSION,
            generated_at: chrono::Local::now().to_rfc3339(),
            vocabulary_size: k,
            idf,
            entries,
        })
    }

    /// インデックスを保存
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// インデックスを読み込み（存在しなければエラー）
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BofSearchError::MissingIndex);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let index: BowIndex = serde_json::from_reader(reader)?;

        if index.version != Self::CURRENT_VERSION {
            return Err(BofSearchError::ArtifactFormat(format!(
                "インデックスのバージョンが不正: {} (期待: {})",
                index.version,
                Self::CURRENT_VERSION
            )));
        }
        if index.idf.len() != index.vocabulary_size {
            return Err(BofSearchError::ArtifactFormat(format!(
                "IDFの次元が辞書サイズと一致しません: {} != {}",
                index.idf.len(),
                index.vocabulary_size
            )));
        }

        Ok(index)
    }

    /// 辞書との組み合わせが正しいか確認する
    pub fn ensure_compatible(&self, vocabulary: &Vocabulary) -> Result<()> {
        if vocabulary.len() != self.vocabulary_size {
            return Err(BofSearchError::VocabularySizeMismatch {
                vocabulary: vocabulary.len(),
                index: self.vocabulary_size,
            });
        }
        Ok(())
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 生成日時
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2クラスタの記述子を持つ小さなストアと辞書
    fn small_fixture() -> (FeatureStore, Vocabulary) {
        let mut store = FeatureStore::default();
        store.insert(
            "low.jpg".to_string(),
            "h1".to_string(),
            vec![vec![0.0, 0.0], vec![0.2, 0.1], vec![0.1, 0.2]],
        );
        store.insert(
            "high.jpg".to_string(),
            "h2".to_string(),
            vec![vec![10.0, 10.0], vec![10.2, 9.9]],
        );
        store.insert(
            "mixed.jpg".to_string(),
            "h3".to_string(),
            vec![vec![0.1, 0.1], vec![9.9, 10.1]],
        );

        let samples: Vec<Vec<f32>> = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.2],
            vec![0.2, 0.1],
            vec![10.0, 10.0],
            vec![9.9, 10.1],
            vec![10.1, 9.9],
        ];
        let vocabulary = Vocabulary::train(&samples, 2, 4, 30, 42).expect("学習失敗");
        (store, vocabulary)
    }

    #[test]
    fn test_build_produces_entry_per_image() {
        let (store, vocabulary) = small_fixture();
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");

        assert_eq!(index.len(), 3);
        assert_eq!(index.vocabulary_size(), 2);
        assert_eq!(index.idf().len(), 2);
        // ファイル名順
        assert_eq!(index.entries()[0].file_name, "high.jpg");
        assert_eq!(index.entries()[1].file_name, "low.jpg");
        assert_eq!(index.entries()[2].file_name, "mixed.jpg");
    }

    #[test]
    fn test_build_vectors_are_normalized() {
        let (store, vocabulary) = small_fixture();
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");

        for entry in index.entries() {
            let norm = entry.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            // ゼロベクトルか単位ベクトルのどちらか
            assert!(norm < 1e-6 || (norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_build_idf_smoothing() {
        // 両視覚語とも少なくとも1画像に出るので idf < ln(N+1)
        let (store, vocabulary) = small_fixture();
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");

        let max_idf = (store.len() as f32 + 1.0).ln();
        for &weight in index.idf() {
            assert!(weight < max_idf);
            assert!(weight >= 0.0);
        }
    }

    #[test]
    fn test_build_empty_store() {
        let store = FeatureStore::default();
        let samples = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]];
        let vocabulary = Vocabulary::train(&samples, 2, 4, 10, 42).expect("学習失敗");

        let result = BowIndex::build(&store, &vocabulary);
        assert!(matches!(result, Err(BofSearchError::NoFeatures(_))));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bow_index.json");

        let (store, vocabulary) = small_fixture();
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");
        index.save(&path).unwrap();

        let restored = BowIndex::load_required(&path).expect("読み込み失敗");
        assert_eq!(restored.len(), index.len());
        assert_eq!(restored.idf(), index.idf());
        assert_eq!(restored.entries()[0].vector, index.entries()[0].vector);
    }

    #[test]
    fn test_load_required_missing() {
        let result = BowIndex::load_required(Path::new("/nonexistent/bow_index.json"));
        assert!(matches!(result, Err(BofSearchError::MissingIndex)));
    }

    #[test]
    fn test_load_required_corrupt_json() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bow_index.json");
        std::fs::write(&path, "{ broken").unwrap();

        let result = BowIndex::load_required(&path);
        assert!(matches!(result, Err(BofSearchError::JsonParse(_))));
    }

    #[test]
    fn test_ensure_compatible_mismatch() {
        let (store, vocabulary) = small_fixture();
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");

        let samples = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let other = Vocabulary::train(&samples, 3, 4, 10, 42).expect("学習失敗");

        let result = index.ensure_compatible(&other);
        assert!(matches!(
            result,
            Err(BofSearchError::VocabularySizeMismatch {
                vocabulary: 3,
                index: 2
            })
        ));
    }
}
