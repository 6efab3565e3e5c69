use bof_search_rust::{cli, config, error, features, index, pipeline, search, server, vocabulary};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Extract { images_dir, force, max_features } => {
            println!("📸 bof-search - 特徴抽出\n");

            let mut config = config;
            if let Some(value) = max_features {
                config.max_features = value;
            }
            let images_dir = images_dir.unwrap_or_else(|| config.images_dir.clone());

            println!("[1/1] 特徴を抽出中...{}", if force { " (強制再抽出)" } else { "" });
            let summary = pipeline::run_extract(&config, &images_dir, force, cli.verbose)?;
            println!(
                "✔ {}枚を検出 (抽出 {} / 再利用 {} / スキップ {})",
                summary.total, summary.extracted, summary.reused, summary.skipped
            );

            println!("\n✅ 特徴抽出完了: {}", config.descriptors_path().display());
        }

        Commands::Dictionary { vocabulary_size, batch_size, iterations, samples_per_image, seed } => {
            println!("📖 bof-search - 辞書学習\n");

            let mut config = config;
            if let Some(value) = vocabulary_size {
                config.vocabulary_size = value;
            }
            if let Some(value) = batch_size {
                config.kmeans_batch_size = value;
            }
            if let Some(value) = iterations {
                config.kmeans_iterations = value;
            }
            if let Some(value) = samples_per_image {
                config.samples_per_image = value;
            }
            if let Some(value) = seed {
                config.kmeans_seed = value;
            }

            println!("[1/1] 視覚辞書を学習中... (k={})", config.vocabulary_size);
            let vocabulary = pipeline::run_dictionary(&config)?;
            println!("✔ {}語の視覚辞書を学習", vocabulary.len());

            println!("\n✅ 辞書学習完了: {}", config.vocabulary_path().display());
        }

        Commands::Bow => {
            println!("📊 bof-search - BoWインデックス構築\n");

            println!("[1/1] BoWベクトルを計算中...");
            let index = pipeline::run_bow(&config)?;
            println!("✔ {}枚のBoWベクトルを計算", index.len());

            println!("\n✅ インデックス構築完了: {}", config.index_path().display());
        }

        Commands::Index { images_dir, force } => {
            println!("🚀 bof-search - インデックス一括構築\n");

            let images_dir = images_dir.unwrap_or_else(|| config.images_dir.clone());

            // 1. 特徴抽出
            println!("[1/3] 特徴を抽出中...{}", if force { " (強制再抽出)" } else { "" });
            let summary = pipeline::run_extract(&config, &images_dir, force, cli.verbose)?;
            println!(
                "✔ {}枚を検出 (抽出 {} / 再利用 {} / スキップ {})\n",
                summary.total, summary.extracted, summary.reused, summary.skipped
            );

            // 2. 辞書学習
            println!("[2/3] 視覚辞書を学習中... (k={})", config.vocabulary_size);
            let vocabulary = pipeline::run_dictionary(&config)?;
            println!("✔ {}語の視覚辞書を学習\n", vocabulary.len());

            // 3. BoWインデックス
            println!("[3/3] BoWベクトルを計算中...");
            let index = pipeline::run_bow(&config)?;
            println!("✔ {}枚のBoWベクトルを計算", index.len());

            println!("\n✅ インデックス構築完了");
        }

        Commands::Search { query, top_k } => {
            println!("🔍 bof-search - 類似検索\n");

            let mut config = config;
            if let Some(value) = top_k {
                config.top_k = value;
            }

            let searcher = search::Searcher::load(&config)?;
            println!("クエリ: {}\n", query.display());

            let ranking = searcher.search_path(&query)?;
            if ranking.is_empty() {
                println!("特徴が抽出できないため類似画像はありません");
            } else {
                for (rank, entry) in ranking.iter().enumerate() {
                    println!("{:>3}. {}  ({:.4})", rank + 1, entry.filename, entry.score);
                }
            }
        }

        Commands::Serve { port, images_dir, cors_origin } => {
            let mut config = config;
            if let Some(value) = port {
                config.server_port = value;
            }
            if let Some(value) = images_dir {
                config.images_dir = value;
            }
            if let Some(value) = cors_origin {
                config.cors_origin = value;
            }

            server::serve(&config).await?;
        }

        Commands::Status => {
            println!("アーティファクト:");

            let descriptors_path = config.descriptors_path();
            if descriptors_path.exists() {
                let store = features::FeatureStore::load_required(&descriptors_path)?;
                println!("  特徴ストア: {}件 (生成 {})", store.len(), store.generated_at());
            } else {
                println!("  特徴ストア: 未生成 (`bof-search extract` で生成)");
            }

            let vocabulary_path = config.vocabulary_path();
            if vocabulary_path.exists() {
                let vocabulary = vocabulary::Vocabulary::load_required(&vocabulary_path)?;
                println!(
                    "  視覚辞書: {}語 (シード {}, 生成 {})",
                    vocabulary.len(),
                    vocabulary.seed(),
                    vocabulary.generated_at()
                );
            } else {
                println!("  視覚辞書: 未生成 (`bof-search dictionary` で生成)");
            }

            let index_path = config.index_path();
            if index_path.exists() {
                let index = index::BowIndex::load_required(&index_path)?;
                println!(
                    "  BoWインデックス: {}件 / {}語 (生成 {})",
                    index.len(),
                    index.vocabulary_size(),
                    index.generated_at()
                );
                if let Ok(meta) = std::fs::metadata(&index_path) {
                    println!("  インデックスサイズ: {} bytes", meta.len());
                }
            } else {
                println!("  BoWインデックス: 未生成 (`bof-search bow` で生成)");
            }
        }

        Commands::Config { show, init } => {
            if init {
                config.save()?;
                println!("✔ 設定を書き出しました: {}", Config::config_path()?.display());
            }

            if show || !init {
                println!("設定:");
                println!("  画像フォルダ: {}", config.images_dir.display());
                println!("  アップロード先: {}", config.upload_dir.display());
                println!("  データフォルダ: {}", config.data_dir.display());
                println!("  視覚語彙サイズ: {}", config.vocabulary_size);
                println!("  特徴点上限: {}", config.max_features);
                println!("  辞書サンプル数/画像: {}", config.samples_per_image);
                println!("  検索上位件数: {}", config.top_k);
                println!("  ポート: {}", config.server_port);
                println!("  CORSオリジン: {}", config.cors_origin);
            }
        }
    }

    Ok(())
}
