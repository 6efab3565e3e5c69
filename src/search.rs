//! 類似画像検索モジュール
//!
//! クエリ画像をBoWベクトルにして、インデックス内の全画像と
//! コサイン類似度で比較し、上位top_k件を返す。

use crate::config::Config;
use crate::error::{BofSearchError, Result};
use crate::features::extract_descriptors;
use crate::index::BowIndex;
use crate::vocabulary::Vocabulary;
use bof_search_common::{cosine_similarity, l1_normalize, term_histogram, tf_idf, top_matches, ScoreEntry};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;

/// 読み込み済みの辞書とインデックスを持つ検索器
pub struct Searcher {
    vocabulary: Vocabulary,
    index: BowIndex,
    max_features: usize,
    top_k: usize,
}

impl Searcher {
    /// 設定のパスから辞書とインデックスを読み込む
    pub fn load(config: &Config) -> Result<Self> {
        let vocabulary = Vocabulary::load_required(&config.vocabulary_path())?;
        let index = BowIndex::load_required(&config.index_path())?;
        Self::from_parts(vocabulary, index, config.max_features, config.top_k)
    }

    /// 読み込み済みの部品から検索器を組み立てる
    pub fn from_parts(
        vocabulary: Vocabulary,
        index: BowIndex,
        max_features: usize,
        top_k: usize,
    ) -> Result<Self> {
        index.ensure_compatible(&vocabulary)?;
        Ok(Self {
            vocabulary,
            index,
            max_features,
            top_k,
        })
    }

    /// クエリ画像に類似した画像をスコア降順で返す
    ///
    /// 特徴が取れない画像では空のランキングを返す。
    pub fn search_image(&self, image: &DynamicImage) -> Result<Vec<ScoreEntry>> {
        let descriptors = extract_descriptors(image, self.max_features);
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = self.vocabulary.assign_all(&descriptors);
        let mut histogram = term_histogram(&assignments, self.vocabulary.len())?;
        l1_normalize(&mut histogram);
        let query = tf_idf(&histogram, self.index.idf())?;

        let scores: Vec<(String, f32)> = self
            .index
            .entries()
            .par_iter()
            .map(|entry| {
                (
                    entry.file_name.clone(),
                    cosine_similarity(&query, &entry.vector),
                )
            })
            .collect();

        let ranked = top_matches(scores, self.top_k);
        Ok(ranked
            .into_iter()
            .map(|(filename, score)| ScoreEntry {
                filename,
                score: score as f64,
            })
            .collect())
    }

    /// パスで指定したクエリ画像を検索する
    pub fn search_path(&self, path: &Path) -> Result<Vec<ScoreEntry>> {
        let image = image::open(path)
            .map_err(|e| BofSearchError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        self.search_image(&image)
    }

    /// インデックス内の画像数
    pub fn corpus_len(&self) -> usize {
        self.index.len()
    }

    /// 1回の検索で返す最大件数
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureStore;
    use image::{GrayImage, Luma};

    /// 2次元記述子の小さなインデックス（次元は検索前の早期リターン用）
    fn tiny_parts() -> (Vocabulary, BowIndex) {
        let mut store = FeatureStore::default();
        store.insert(
            "a.jpg".to_string(),
            "h1".to_string(),
            vec![vec![0.0, 0.0], vec![0.1, 0.1]],
        );
        store.insert(
            "b.jpg".to_string(),
            "h2".to_string(),
            vec![vec![10.0, 10.0]],
        );

        let samples = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
        ];
        let vocabulary = Vocabulary::train(&samples, 2, 4, 20, 42).expect("学習失敗");
        let index = BowIndex::build(&store, &vocabulary).expect("構築失敗");
        (vocabulary, index)
    }

    #[test]
    fn test_from_parts_compatible() {
        let (vocabulary, index) = tiny_parts();
        let searcher = Searcher::from_parts(vocabulary, index, 2000, 10);
        assert!(searcher.is_ok());
        assert_eq!(searcher.unwrap().corpus_len(), 2);
    }

    #[test]
    fn test_from_parts_size_mismatch() {
        let (_, index) = tiny_parts();
        let samples = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let other = Vocabulary::train(&samples, 3, 4, 10, 42).expect("学習失敗");

        let result = Searcher::from_parts(other, index, 2000, 10);
        assert!(matches!(
            result,
            Err(BofSearchError::VocabularySizeMismatch { .. })
        ));
    }

    #[test]
    fn test_search_flat_image_returns_empty() {
        // 平坦な画像は特徴ゼロ → ランキングは空
        let (vocabulary, index) = tiny_parts();
        let searcher = Searcher::from_parts(vocabulary, index, 2000, 10).expect("組み立て失敗");

        let flat = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([100u8])));
        let ranking = searcher.search_image(&flat).expect("検索失敗");
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_search_path_missing_file() {
        let (vocabulary, index) = tiny_parts();
        let searcher = Searcher::from_parts(vocabulary, index, 2000, 10).expect("組み立て失敗");

        let result = searcher.search_path(Path::new("/nonexistent/query.jpg"));
        assert!(matches!(result, Err(BofSearchError::ImageLoad(_))));
    }
}
