//! アップロードフォームコンポーネント
//!
//! ファイル選択・プレビュー表示・送信ボタン。
//! 送信中は選択と送信の両方を無効化する。

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{File, HtmlInputElement, SubmitEvent};

#[component]
pub fn UploadForm<FP, FS>(
    selected_name: Signal<Option<String>>,
    preview_url: Signal<Option<String>>,
    is_loading: Signal<bool>,
    on_pick: FP,
    on_submit: FS,
) -> impl IntoView
where
    FP: Fn(Option<File>) + 'static + Clone + Send,
    FS: Fn(()) + 'static + Clone + Send,
{
    let handle_change = move |ev: web_sys::Event| {
        // キャンセル時はfilesが空になる
        let file = ev
            .target()
            .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files())
            .and_then(|files| files.get(0));
        on_pick(file);
    };

    let handle_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        on_submit(());
    };

    view! {
        <form class="upload-form" on:submit=handle_submit>
            <input
                type="file"
                accept="image/*"
                disabled=move || is_loading.get()
                on:change=handle_change
            />

            <button
                type="submit"
                class="btn btn-primary"
                disabled=move || is_loading.get() || selected_name.get().is_none()
            >
                {move || {
                    if is_loading.get() {
                        "アップロード中...".to_string()
                    } else {
                        match selected_name.get() {
                            Some(name) => format!("{} を送信", name),
                            None => "ファイルを送信".to_string(),
                        }
                    }
                }}
            </button>
        </form>

        {move || {
            preview_url.get().map(|url| {
                view! {
                    <div class="preview-box">
                        <img src=url alt="選択画像のプレビュー" />
                    </div>
                }
            })
        }}
    }
}
