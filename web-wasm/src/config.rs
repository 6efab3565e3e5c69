//! バックエンドのエンドポイント設定
//!
//! コンテキスト経由で各コンポーネントへ注入する。

/// アップロード先と画像配信のベースURL
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    /// アップロードAPIのURL
    pub upload_url: String,
    /// 画像配信のベースURL
    pub image_base: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            upload_url: "http://127.0.0.1:8000/upload".to_string(),
            image_base: "http://127.0.0.1:8000/images".to_string(),
        }
    }
}

impl ApiConfig {
    /// ファイル名から画像URLを組み立てる
    ///
    /// ファイル名はパーセントエンコードする（空白や日本語を含む場合がある）。
    pub fn image_url(&self, filename: &str) -> String {
        format!(
            "{}/{}",
            self.image_base.trim_end_matches('/'),
            urlencoding::encode(filename)
        )
    }
}
