//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Vocabulary error: 視覚語彙が空です")]
    EmptyVocabulary,

    #[error("Dimension error: 期待 {expected} 次元, 実際 {actual} 次元")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
