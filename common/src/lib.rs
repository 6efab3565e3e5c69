//! BoF Search Common Library
//!
//! CLI/サーバとWeb(WASM)で共有される型とBoWベクトル計算

pub mod bow;
pub mod error;
pub mod similarity;
pub mod types;

pub use bow::{idf, l1_normalize, l2_normalize, term_histogram, tf_idf};
pub use error::{Error, Result};
pub use similarity::{cosine_similarity, top_matches};
pub use types::{encode_score_map, format_score, parse_score_map, ScoreEntry, UploadResponse};
