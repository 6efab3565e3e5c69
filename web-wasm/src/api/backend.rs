//! 検索バックエンド連携
//!
//! multipart/form-data で画像を1枚アップロードし、
//! 類似画像ランキング入りのレスポンスを受け取る。

use bof_search_common::UploadResponse;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

/// アップロード失敗の種別
#[derive(Clone, Debug, PartialEq)]
pub enum UploadError {
    /// HTTPステータスが2xx以外（本文テキスト付き）
    Http { status: u16, body: String },
    /// 通信失敗・例外
    Network(String),
    /// 成功レスポンスの解析失敗
    Parse(String),
}

impl UploadError {
    /// エラーバナーに表示するメッセージ
    pub fn message(&self) -> String {
        match self {
            UploadError::Http { status, body } => {
                format!("HTTPエラー: {}。サーバー応答: {}", status, body)
            }
            UploadError::Network(message) | UploadError::Parse(message) => {
                format!("アップロードエラー: {}", message)
            }
        }
    }
}

/// JsValueから人間が読めるメッセージを取り出す
fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| "不明なエラー".to_string())
}

/// 画像をアップロードして検索結果を受け取る
///
/// Content-Typeは指定しない（ブラウザがmultipart境界付きで設定する）。
pub async fn upload_image(upload_url: &str, file: &File) -> Result<UploadResponse, UploadError> {
    let form = FormData::new().map_err(|e| UploadError::Network(js_error_message(&e)))?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(|e| UploadError::Network(js_error_message(&e)))?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init(upload_url, &opts)
        .map_err(|e| UploadError::Network(js_error_message(&e)))?;

    let window =
        web_sys::window().ok_or_else(|| UploadError::Network("windowがありません".to_string()))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| UploadError::Network(js_error_message(&e)))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|e| UploadError::Network(js_error_message(&e)))?;

    if !resp.ok() {
        // 本文テキストをそのままエラーメッセージに載せる
        let body = match resp.text() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .ok()
                .and_then(|value| value.as_string())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        return Err(UploadError::Http {
            status: resp.status(),
            body,
        });
    }

    let json_promise = resp
        .json()
        .map_err(|e| UploadError::Parse(js_error_message(&e)))?;
    let json = JsFuture::from(json_promise)
        .await
        .map_err(|e| UploadError::Parse(js_error_message(&e)))?;

    serde_wasm_bindgen::from_value(json).map_err(|e| UploadError::Parse(e.to_string()))
}
