//! ヘッダーコンポーネント

use leptos::prelude::*;

#[component]
pub fn Header() -> impl IntoView {
    view! {
        <header class="header">
            <h2>"Bag of features - 類似画像検索"</h2>
        </header>
    }
}
