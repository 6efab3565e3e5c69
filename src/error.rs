use thiserror::Error;

#[derive(Error, Debug)]
pub enum BofSearchError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("特徴が抽出できません: {0}")]
    NoFeatures(String),

    #[error("辞書が未生成です。`bof-search dictionary` を先に実行してください")]
    MissingVocabulary,

    #[error("インデックスが未生成です。`bof-search bow` を先に実行してください")]
    MissingIndex,

    #[error("特徴ストアが未生成です。`bof-search extract <IMAGES_DIR>` を先に実行してください")]
    MissingFeatureStore,

    #[error("アーティファクト形式エラー: {0}")]
    ArtifactFormat(String),

    #[error("辞書サイズ不一致: 辞書 {vocabulary} 語, インデックス {index} 語")]
    VocabularySizeMismatch { vocabulary: usize, index: usize },

    #[error("BoW計算エラー: {0}")]
    Bow(#[from] bof_search_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("サーバ起動エラー: {0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, BofSearchError>;
