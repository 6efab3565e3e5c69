//! Bag of Features ベクトル計算
//!
//! 視覚語への割り当て列からBoWヒストグラムを作り、
//! IDF重み付けとL2正規化を経て比較可能なベクトルにする。
//!
//! 計算式:
//! - ヒストグラム: 視覚語の出現回数をL1正規化
//! - IDF: ln((N + 1) / (df + 1))  ※Nは画像数、dfは視覚語の文書頻度
//! - TF-IDF: ヒストグラム×IDF をL2正規化

use crate::error::{Error, Result};

/// 視覚語割り当て列から出現回数ヒストグラムを作る
///
/// 割り当て値は `vocabulary_size` 未満であること。
pub fn term_histogram(assignments: &[usize], vocabulary_size: usize) -> Result<Vec<f32>> {
    if vocabulary_size == 0 {
        return Err(Error::EmptyVocabulary);
    }
    let mut histogram = vec![0.0f32; vocabulary_size];
    for &word in assignments {
        histogram[word] += 1.0;
    }
    Ok(histogram)
}

/// L1正規化（合計1にする）
///
/// 合計が0のベクトルはそのまま返す。
pub fn l1_normalize(vector: &mut [f32]) {
    let sum: f32 = vector.iter().sum();
    if sum > 0.0 {
        for value in vector.iter_mut() {
            *value /= sum;
        }
    }
}

/// L2正規化（ノルム1にする）
///
/// ノルムが0のベクトルはそのまま返す。
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// 視覚語ごとのIDFを計算する
///
/// 平滑化付き: ln((N + 1) / (df + 1))。未出現語でもゼロ除算しない。
pub fn idf(document_frequency: &[u32], corpus_size: usize) -> Vec<f32> {
    let n = corpus_size as f32 + 1.0;
    document_frequency
        .iter()
        .map(|&df| (n / (df as f32 + 1.0)).ln())
        .collect()
}

/// ヒストグラムにIDF重みを掛けてL2正規化したベクトルを返す
pub fn tf_idf(histogram: &[f32], idf: &[f32]) -> Result<Vec<f32>> {
    if histogram.len() != idf.len() {
        return Err(Error::DimensionMismatch {
            expected: idf.len(),
            actual: histogram.len(),
        });
    }
    let mut weighted: Vec<f32> = histogram
        .iter()
        .zip(idf.iter())
        .map(|(h, w)| h * w)
        .collect();
    l2_normalize(&mut weighted);
    Ok(weighted)
}
