//! メインアプリケーションコンポーネント

use crate::api::backend;
use crate::components::{header::Header, results_list::ResultsList, upload_form::UploadForm};
use crate::config::ApiConfig;
use crate::preview::PreviewSlot;
use bof_search_common::UploadResponse;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{File, Url};

/// アップロードの進行状態
///
/// 排他的な1状態のみを持つ。loadingとerrorの同時成立はない。
#[derive(Clone, Debug, PartialEq)]
pub enum UploadStatus {
    Idle,
    Loading,
    Error(String),
    Success(UploadResponse),
}

impl UploadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, UploadStatus::Loading)
    }
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let api_config = ApiConfig::default();
    provide_context(api_config.clone());

    // web_sys::FileはSendでないためローカルシグナルに置く
    let selected_file = RwSignal::new_local(None::<File>);
    let preview = RwSignal::new(PreviewSlot::default());
    let status = RwSignal::new(UploadStatus::Idle);

    let selected_name =
        Signal::derive(move || selected_file.with(|file| file.as_ref().map(|f| f.name())));
    let preview_url =
        Signal::derive(move || preview.with(|slot| slot.current().map(String::from)));
    let is_loading = Signal::derive(move || status.with(|s| s.is_loading()));

    // ファイル選択: 旧プレビューURLをちょうど1回解放して差し替える
    let on_pick = move |file: Option<File>| {
        let released = match &file {
            Some(picked) => {
                let url = Url::create_object_url_with_blob(picked).ok();
                preview.try_update(|slot| match url {
                    Some(url) => slot.replace(url),
                    None => slot.take(),
                })
            }
            None => preview.try_update(|slot| slot.take()),
        };
        if let Some(Some(old)) = released {
            let _ = Url::revoke_object_url(&old);
        }

        match file {
            Some(picked) => {
                selected_file.set(Some(picked));
                // 前回の結果・エラーを消す
                status.set(UploadStatus::Idle);
            }
            None => selected_file.set(None),
        }
    };

    // 送信: 未選択ならバリデーションエラー、成功でファイルのみクリア
    let upload_url = api_config.upload_url.clone();
    let on_submit = move |_: ()| {
        let Some(file) = selected_file.get_untracked() else {
            status.set(UploadStatus::Error("ファイルを選択してください".to_string()));
            return;
        };

        status.set(UploadStatus::Loading);

        let upload_url = upload_url.clone();
        spawn_local(async move {
            match backend::upload_image(&upload_url, &file).await {
                Ok(response) => {
                    // プレビューは次の選択まで残す
                    selected_file.set(None);
                    status.set(UploadStatus::Success(response));
                }
                Err(error) => {
                    status.set(UploadStatus::Error(error.message()));
                }
            }
        });
    };

    // アンマウント時にプレビューURLを解放
    on_cleanup(move || {
        if let Some(Some(url)) = preview.try_update(|slot| slot.take()) {
            let _ = Url::revoke_object_url(&url);
        }
    });

    view! {
        <div class="container">
            <Header />

            <UploadForm
                selected_name=selected_name
                preview_url=preview_url
                is_loading=is_loading
                on_pick=on_pick
                on_submit=on_submit
            />

            {move || match status.get() {
                UploadStatus::Error(message) => view! {
                    <div class="error-banner">"エラー: " {message}</div>
                }
                .into_any(),
                UploadStatus::Success(response) => view! {
                    <ResultsList response=response />
                }
                .into_any(),
                _ => view! { <span></span> }.into_any(),
            }}
        </div>
    }
}
