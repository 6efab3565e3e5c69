//! 検索結果リストコンポーネント
//!
//! レスポンスの result 文字列を解析し、スコア順のまま
//! サムネイル付きで並べる。解析に失敗したら空リスト。

use crate::config::ApiConfig;
use bof_search_common::{format_score, parse_score_map, ScoreEntry, UploadResponse};
use leptos::prelude::*;

/// 読み込み失敗時に表示するプレースホルダ画像
const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;utf8,<svg xmlns='http://www.w3.org/2000/svg' width='60' height='60'><rect width='60' height='60' fill='%23ccc'/><text x='30' y='35' font-size='10' fill='%23666' text-anchor='middle'>No Img</text></svg>";

#[component]
pub fn ResultsList(response: UploadResponse) -> impl IntoView {
    let api_config = use_context::<ApiConfig>().unwrap_or_default();

    let entries = parse_score_map(&response.result).unwrap_or_default();
    let uploaded_file = response.uploaded_file.clone();

    view! {
        <div class="results">
            <h3>"✨ 類似画像 Top-10"</h3>

            <For
                each=move || entries.clone()
                key=|entry| entry.filename.clone()
                children=move |entry| {
                    let image_url = api_config.image_url(&entry.filename);
                    view! { <ResultItem entry=entry image_url=image_url /> }
                }
            />

            <p class="uploaded-file">"アップロードファイル: " {uploaded_file}</p>
        </div>
    }
}

#[component]
fn ResultItem(entry: ScoreEntry, image_url: String) -> impl IntoView {
    // 読み込み失敗は1回だけプレースホルダへ差し替える
    let (failed, set_failed) = signal(false);

    let filename = entry.filename.clone();
    let alt_normal = format!("類似画像: {}", entry.filename);
    let alt_failed = format!("[画像が見つかりません] {}", entry.filename);

    view! {
        <div class="result-item">
            <div class="result-main">
                <img
                    class="result-thumb"
                    class:fallback=move || failed.get()
                    src=move || {
                        if failed.get() {
                            PLACEHOLDER_IMAGE.to_string()
                        } else {
                            image_url.clone()
                        }
                    }
                    alt=move || {
                        if failed.get() {
                            alt_failed.clone()
                        } else {
                            alt_normal.clone()
                        }
                    }
                    on:error=move |_| {
                        if !failed.get_untracked() {
                            set_failed.set(true);
                        }
                    }
                />
                <span class="result-name">{filename}</span>
            </div>
            <span class="result-score">{format_score(entry.score)}</span>
        </div>
    }
}
