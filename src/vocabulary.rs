//! 視覚辞書モジュール
//!
//! サンプリングした記述子をミニバッチk-meansでクラスタリングし、
//! k個の視覚語（クラスタ中心）を学習する。シード固定で再現可能。
//!
//! 学習手順:
//! 1. バッチサイズの3倍までの部分集合でk-means++初期化
//! 2. 毎回ランダムなミニバッチを取り、最近傍中心を
//!    学習率 1/割り当て回数 で更新（`iterations` 回）

use crate::error::{BofSearchError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// 視覚辞書（学習済みクラスタ中心）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 生成日時
    generated_at: String,
    /// 学習時の乱数シード
    seed: u64,
    /// 視覚語の中心ベクトル
    centers: Vec<Vec<f32>>,
}

impl Vocabulary {
    const CURRENT_VERSION: u32 = 1;

    /// ミニバッチk-meansで辞書を学習する
    pub fn train(
        samples: &[Vec<f32>],
        k: usize,
        batch_size: usize,
        iterations: usize,
        seed: u64,
    ) -> Result<Self> {
        if k == 0 {
            return Err(bof_search_common::Error::EmptyVocabulary.into());
        }
        if samples.is_empty() {
            return Err(BofSearchError::NoFeatures(
                "辞書学習用の記述子がありません".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);

        // サンプルがk個以下なら循環させてそのまま中心にする
        if samples.len() <= k {
            let centers = (0..k).map(|i| samples[i % samples.len()].clone()).collect();
            return Ok(Self::from_centers(centers, seed));
        }

        let mut centers = init_plus_plus(samples, k, batch_size, &mut rng);

        let batch_size = batch_size.min(samples.len()).max(1);
        let mut counts = vec![0u64; k];

        for _ in 0..iterations {
            let batch: Vec<usize> = (0..batch_size)
                .map(|_| rng.random_range(0..samples.len()))
                .collect();

            // 割り当ては並列、中心の更新は逐次
            let assignments: Vec<usize> = batch
                .par_iter()
                .map(|&sample_index| nearest_center(&centers, &samples[sample_index]))
                .collect();

            for (&sample_index, &center_index) in batch.iter().zip(assignments.iter()) {
                counts[center_index] += 1;
                let eta = 1.0 / counts[center_index] as f32;
                let center = &mut centers[center_index];
                for (value, sample_value) in center.iter_mut().zip(samples[sample_index].iter()) {
                    *value += eta * (sample_value - *value);
                }
            }
        }

        Ok(Self::from_centers(centers, seed))
    }

    fn from_centers(centers: Vec<Vec<f32>>, seed: u64) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            generated_at: chrono::Local::now().to_rfc3339(),
            seed,
            centers,
        }
    }

    /// 記述子に最も近い視覚語の番号を返す
    pub fn assign(&self, descriptor: &[f32]) -> usize {
        nearest_center(&self.centers, descriptor)
    }

    /// 記述子列をまとめて割り当てる
    pub fn assign_all(&self, descriptors: &[Vec<f32>]) -> Vec<usize> {
        descriptors
            .par_iter()
            .map(|descriptor| self.assign(descriptor))
            .collect()
    }

    /// 視覚語の数
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// 学習時のシード
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// 生成日時
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    /// 辞書を保存
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// 辞書を読み込み（存在しなければエラー）
    pub fn load_required(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BofSearchError::MissingVocabulary);
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let vocabulary: Vocabulary = serde_json::from_reader(reader)?;

        if vocabulary.version != Self::CURRENT_VERSION {
            return Err(BofSearchError::ArtifactFormat(format!(
                "辞書のバージョンが不正: {} (期待: {})",
                vocabulary.version,
                Self::CURRENT_VERSION
            )));
        }
        if vocabulary.is_empty() {
            return Err(bof_search_common::Error::EmptyVocabulary.into());
        }

        Ok(vocabulary)
    }
}

/// k-means++方式の初期中心選択
///
/// バッチサイズの3倍までの部分集合上で、既存中心からの距離の
/// 2乗に比例した確率で次の中心を選ぶ。
fn init_plus_plus(
    samples: &[Vec<f32>],
    k: usize,
    batch_size: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    let init_size = (batch_size * 3).clamp(1, samples.len());
    let subset = sample_distinct(samples.len(), init_size, rng);

    let mut centers: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = subset[rng.random_range(0..subset.len())];
    centers.push(samples[first].clone());

    let mut distances: Vec<f32> = subset
        .iter()
        .map(|&i| squared_distance(&samples[i], &centers[0]))
        .collect();

    while centers.len() < k {
        let total: f32 = distances.iter().sum();
        if total <= 0.0 {
            // 部分集合が1点に縮退している場合は循環で埋める
            let index = centers.len() % subset.len();
            centers.push(samples[subset[index]].clone());
            continue;
        }

        let mut target = rng.random_range(0.0..total);
        let mut chosen = subset.len() - 1;
        for (position, &distance) in distances.iter().enumerate() {
            if target < distance {
                chosen = position;
                break;
            }
            target -= distance;
        }

        let center = samples[subset[chosen]].clone();
        for (position, &sample_index) in subset.iter().enumerate() {
            let distance = squared_distance(&samples[sample_index], &center);
            if distance < distances[position] {
                distances[position] = distance;
            }
        }
        centers.push(center);
    }

    centers
}

/// 0..n から重複なしで count 個の添字を選ぶ（部分Fisher-Yates）
pub(crate) fn sample_distinct(n: usize, count: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let count = count.min(n);
    for i in 0..count {
        let j = rng.random_range(i..n);
        indices.swap(i, j);
    }
    indices.truncate(count);
    indices
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn nearest_center(centers: &[Vec<f32>], point: &[f32]) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (index, center) in centers.iter().enumerate() {
        let distance = squared_distance(center, point);
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}
