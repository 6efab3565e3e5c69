//! コサイン類似度とランキング
//!
//! BoWベクトルは事前にL2正規化されているため、
//! コサイン類似度は内積そのもの。

use std::cmp::Ordering;

/// L2正規化済みベクトル同士のコサイン類似度
///
/// 前提: 両ベクトルは同じ次元でL2正規化済み。
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// スコア降順で上位 `top_k` 件を返す
///
/// 安定ソートなので同点は元の並び順を保つ。
pub fn top_matches(mut scores: Vec<(String, f32)>, top_k: usize) -> Vec<(String, f32)> {
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scores.truncate(top_k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![0.6, 0.8];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_top_matches_sorts_descending() {
        let scores = vec![
            ("low.jpg".to_string(), 0.2),
            ("high.jpg".to_string(), 0.9),
            ("mid.jpg".to_string(), 0.5),
        ];

        let ranked = top_matches(scores, 10);
        assert_eq!(ranked[0].0, "high.jpg");
        assert_eq!(ranked[1].0, "mid.jpg");
        assert_eq!(ranked[2].0, "low.jpg");
    }

    #[test]
    fn test_top_matches_truncates() {
        let scores = vec![
            ("a.jpg".to_string(), 0.9),
            ("b.jpg".to_string(), 0.8),
            ("c.jpg".to_string(), 0.7),
        ];

        let ranked = top_matches(scores, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].0, "b.jpg");
    }

    #[test]
    fn test_top_matches_stable_on_ties() {
        // 同点はコーパス順のまま
        let scores = vec![
            ("first.jpg".to_string(), 0.5),
            ("second.jpg".to_string(), 0.5),
            ("third.jpg".to_string(), 0.5),
        ];

        let ranked = top_matches(scores, 10);
        assert_eq!(ranked[0].0, "first.jpg");
        assert_eq!(ranked[1].0, "second.jpg");
        assert_eq!(ranked[2].0, "third.jpg");
    }

    #[test]
    fn test_top_matches_fewer_than_k() {
        let scores = vec![("only.jpg".to_string(), 0.3)];
        let ranked = top_matches(scores, 10);
        assert_eq!(ranked.len(), 1);
    }
}
