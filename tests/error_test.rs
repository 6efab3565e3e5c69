//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use bof_search_rust::error::BofSearchError;
use bof_search_rust::scanner;
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(result.is_err());

    let err = result.unwrap_err();
    assert!(matches!(err, BofSearchError::FolderNotFound(_)));
}

/// 空のフォルダをスキャンした場合
#[test]
fn test_scan_empty_folder() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = scanner::scan_folder(dir.path());

    // 空フォルダはエラーではなく空のVecを返す
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");

    // テキストファイルのみ作成
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path());
    assert!(result.is_ok());
    assert!(result.unwrap().is_empty());
}

/// BofSearchErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        BofSearchError::Config("テスト設定エラー".to_string()),
        BofSearchError::FileNotFound("test.jpg".to_string()),
        BofSearchError::FolderNotFound("/path/to/folder".to_string()),
        BofSearchError::ImageLoad("壊れたファイル".to_string()),
        BofSearchError::NoImagesFound("フォルダ".to_string()),
        BofSearchError::NoFeatures("平坦な画像".to_string()),
        BofSearchError::ArtifactFormat("バージョン不正".to_string()),
        BofSearchError::Server("ポート使用中".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 未生成アーティファクトのエラーは次に実行すべきコマンドを案内する
#[test]
fn test_missing_artifact_hints() {
    let display = format!("{}", BofSearchError::MissingFeatureStore);
    assert!(display.contains("bof-search extract"));

    let display = format!("{}", BofSearchError::MissingVocabulary);
    assert!(display.contains("bof-search dictionary"));

    let display = format!("{}", BofSearchError::MissingIndex);
    assert!(display.contains("bof-search bow"));
}

/// 辞書サイズ不一致エラーは両方のサイズを表示する
#[test]
fn test_vocabulary_size_mismatch_message() {
    let err = BofSearchError::VocabularySizeMismatch {
        vocabulary: 700,
        index: 500,
    };
    let display = format!("{}", err);

    assert!(display.contains("700"));
    assert!(display.contains("500"));
}

/// エラーのDebug実装確認
#[test]
fn test_error_debug() {
    let err = BofSearchError::Config("テスト".to_string());
    let debug = format!("{:?}", err);

    assert!(debug.contains("Config"));
    assert!(debug.contains("テスト"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: BofSearchError = io_err.into();

    assert!(matches!(err, BofSearchError::Io(_)));
    let display = format!("{}", err);
    assert!(display.contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: BofSearchError = json_err.into();

    assert!(matches!(err, BofSearchError::JsonParse(_)));
}

/// common::Errorからの変換
#[test]
fn test_common_error_conversion() {
    let common_err = bof_search_common::Error::EmptyVocabulary;
    let err: BofSearchError = common_err.into();

    assert!(matches!(err, BofSearchError::Bow(_)));
    let display = format!("{}", err);
    assert!(display.contains("BoW計算エラー"));
}

/// 次元不一致エラーのメッセージが透過される
#[test]
fn test_dimension_mismatch_propagates_detail() {
    let common_err = bof_search_common::Error::DimensionMismatch {
        expected: 8,
        actual: 4,
    };
    let err: BofSearchError = common_err.into();

    let display = format!("{}", err);
    assert!(display.contains("8"));
    assert!(display.contains("4"));
}
