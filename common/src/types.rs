//! アップロード応答の型定義
//!
//! CLI/サーバとWeb(WASM)で共有される型:
//! - UploadResponse: POST /upload の応答エンベロープ
//! - ScoreEntry: 類似度ランキングの1エントリ
//!
//! `result` フィールドは「JSON文字列を値に持つJSON」という二重
//! エンコードのまま運ぶ（ワイヤ互換のため）。復号は
//! [`parse_score_map`]、符号化は [`encode_score_map`] で行う。

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// POST /upload の応答エンベロープ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// サーバに保存されたファイルのパス
    pub uploaded_file: String,

    /// ファイル名→スコアのマップをJSON文字列として持つ
    #[serde(default)]
    pub result: String,
}

/// 類似度ランキングの1エントリ
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub filename: String,
    pub score: f64,
}

/// 二重エンコードされたスコアマップ文字列を復号する
///
/// キーの出現順を保持する（ランキング順のまま描画するため）。
/// 数値でない値を持つキーは読み飛ばす。
pub fn parse_score_map(raw: &str) -> Result<Vec<ScoreEntry>> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
    let entries = map
        .into_iter()
        .filter_map(|(filename, value)| {
            value.as_f64().map(|score| ScoreEntry { filename, score })
        })
        .collect();
    Ok(entries)
}

/// ランキングをスコアマップのJSON文字列へ符号化する
///
/// エントリ順がそのままJSONのキー順になる。
pub fn encode_score_map(entries: &[ScoreEntry]) -> Result<String> {
    let mut map = serde_json::Map::new();
    for entry in entries {
        map.insert(
            entry.filename.clone(),
            serde_json::Value::from(entry.score),
        );
    }
    Ok(serde_json::to_string(&map)?)
}

/// スコアの表示用文字列
///
/// 整数値のスコアは小数点を付けずに表示する（9.0 → "9"）。
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}
