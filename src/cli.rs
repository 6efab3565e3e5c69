use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bof-search")]
#[command(about = "Bag of Features 類似画像検索ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像フォルダから特徴を抽出して保存
    Extract {
        /// 画像フォルダのパス（省略時は設定値）
        images_dir: Option<PathBuf>,

        /// ハッシュが一致しても再抽出する
        #[arg(short, long)]
        force: bool,

        /// 1画像あたりの特徴点上限
        #[arg(long)]
        max_features: Option<usize>,
    },

    /// 抽出済みの特徴から視覚辞書を学習
    Dictionary {
        /// 視覚語彙のサイズ
        #[arg(short = 'k', long)]
        vocabulary_size: Option<usize>,

        /// ミニバッチサイズ
        #[arg(long)]
        batch_size: Option<usize>,

        /// 学習の反復回数
        #[arg(long)]
        iterations: Option<usize>,

        /// 辞書学習に使う1画像あたりの記述子数
        #[arg(long)]
        samples_per_image: Option<usize>,

        /// 乱数シード
        #[arg(long)]
        seed: Option<u64>,
    },

    /// 全画像のBoWベクトルを計算してインデックスを保存
    Bow,

    /// extract → dictionary → bow を一括実行
    Index {
        /// 画像フォルダのパス（省略時は設定値）
        images_dir: Option<PathBuf>,

        /// ハッシュが一致しても再抽出する
        #[arg(short, long)]
        force: bool,
    },

    /// クエリ画像に類似した画像を検索
    Search {
        /// クエリ画像のパス
        #[arg(required = true)]
        query: PathBuf,

        /// 表示する上位件数
        #[arg(short = 'n', long)]
        top_k: Option<usize>,
    },

    /// 検索APIサーバを起動
    Serve {
        /// 待ち受けポート
        #[arg(short, long)]
        port: Option<u16>,

        /// 配信する画像フォルダ
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// 許可するCORSオリジン
        #[arg(long)]
        cors_origin: Option<String>,
    },

    /// アーティファクトの状態を表示
    Status,

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// デフォルト設定ファイルを書き出す
        #[arg(long)]
        init: bool,
    },
}
