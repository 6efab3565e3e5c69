//! HTTPサーバモジュール
//!
//! フロントエンド向けのAPI:
//! - POST /upload: multipartの `file` フィールドを保存し、類似画像を検索して
//!   `{"uploaded_file": "...", "result": "<スコアマップのJSON文字列>"}` を返す
//! - GET /images/<ファイル名>: インデックス対象画像の静的配信
//!
//! `result` がJSON文字列の二重エンコードなのはワイヤ互換のため。

use crate::config::Config;
use crate::error::{BofSearchError, Result};
use crate::search::Searcher;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use bof_search_common::{encode_score_map, UploadResponse};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

/// アップロードサイズ上限
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// ハンドラ間で共有する状態
pub struct AppState {
    pub searcher: Searcher,
    pub upload_dir: PathBuf,
}

/// ルータを組み立てる
pub fn build_router(state: Arc<AppState>, images_dir: &Path, cors_origin: &str) -> Result<Router> {
    let origin: HeaderValue = cors_origin
        .parse()
        .map_err(|_| BofSearchError::Server(format!("CORSオリジンが不正です: {}", cors_origin)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/upload", post(upload_handler))
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state))
}

/// サーバを起動する
pub async fn serve(config: &Config) -> Result<()> {
    init_tracing();

    let searcher = Searcher::load(config)?;
    let corpus_len = searcher.corpus_len();

    std::fs::create_dir_all(&config.upload_dir)?;
    if !config.images_dir.exists() {
        warn!(
            images_dir = %config.images_dir.display(),
            "画像フォルダが存在しません。/images は404を返します"
        );
    }

    let state = Arc::new(AppState {
        searcher,
        upload_dir: config.upload_dir.clone(),
    });
    let app = build_router(state, &config.images_dir, &config.cors_origin)?;

    let addr = format!("127.0.0.1:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("🚀 サーバ起動: http://{}", addr);
    println!("   インデックス画像数: {}", corpus_len);
    info!(addr = %addr, corpus = corpus_len, "サーバ起動");

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // テストなどで二重初期化されても無視する
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> std::result::Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() == Some("file") {
            let file_name = sanitize_file_name(field.file_name());
            let data = field.bytes().await.map_err(bad_request)?;
            upload = Some((file_name, data.to_vec()));
            break;
        }
    }

    let Some((file_name, data)) = upload else {
        return Err((
            StatusCode::BAD_REQUEST,
            "multipartフィールド 'file' がありません".to_string(),
        ));
    };

    let image = image::load_from_memory(&data)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("画像を読み込めません: {}", e)))?;

    let saved_path = state.upload_dir.join(&file_name);
    tokio::fs::write(&saved_path, &data)
        .await
        .map_err(internal_error)?;

    // 特徴抽出と比較はCPU負荷が高いのでブロッキングスレッドで行う
    let shared = Arc::clone(&state);
    let ranking = tokio::task::spawn_blocking(move || shared.searcher.search_image(&image))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)?;

    if ranking.is_empty() {
        info!(file = %file_name, "クエリ画像から特徴が取れませんでした");
    } else {
        info!(file = %file_name, matches = ranking.len(), "検索完了");
    }

    let result = encode_score_map(&ranking).map_err(internal_error)?;

    Ok(Json(UploadResponse {
        uploaded_file: saved_path.to_string_lossy().into_owned(),
        result,
    }))
}

/// クライアントのファイル名からパス要素を取り除く
fn sanitize_file_name(raw: Option<&str>) -> String {
    raw.and_then(|name| Path::new(name).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "upload.bin".to_string())
}

fn bad_request<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        format!("リクエストを読み取れません: {}", e),
    )
}

fn internal_error<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!("サーバ内部エラー: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("サーバ内部エラー: {}", e),
    )
}
