//! インデックス構築パイプライン
//!
//! 3ステージを順に実行するとインデックスが完成する:
//! 1. extract: 画像スキャン→記述子抽出（SHA-256で未変更をスキップ）
//! 2. dictionary: 記述子をサンプリングして視覚辞書を学習
//! 3. bow: 全画像をBoWベクトル化してインデックスを保存

use crate::config::Config;
use crate::error::{BofSearchError, Result};
use crate::features::{self, Descriptor, FeatureStore};
use crate::index::BowIndex;
use crate::scanner;
use crate::vocabulary::{sample_distinct, Vocabulary};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// extractステージの結果
pub struct ExtractSummary {
    /// スキャンで見つかった画像数
    pub total: usize,
    /// 今回記述子を抽出した画像数
    pub extracted: usize,
    /// ハッシュ一致で再利用した画像数
    pub reused: usize,
    /// 特徴が取れずスキップした画像数
    pub skipped: usize,
}

/// 画像フォルダから記述子を抽出して特徴ストアを更新する
pub fn run_extract(
    config: &Config,
    images_dir: &Path,
    force: bool,
    verbose: bool,
) -> Result<ExtractSummary> {
    let images = scanner::scan_folder(images_dir)?;
    if images.is_empty() {
        return Err(BofSearchError::NoImagesFound(
            images_dir.display().to_string(),
        ));
    }

    let mut store = if force {
        FeatureStore::default()
    } else {
        FeatureStore::load_or_default(&config.descriptors_path())
    };

    // フォルダから消えた画像のエントリを落とす
    let keep: HashSet<String> = images.iter().map(|i| i.file_name.clone()).collect();
    store.retain_files(&keep);

    let mut pending = Vec::new();
    let mut reused = 0usize;
    for image in &images {
        let hash = features::compute_file_hash(&image.path)?;
        if store.get_if_unchanged(&image.file_name, &hash).is_some() {
            reused += 1;
        } else {
            pending.push((image.clone(), hash));
        }
    }

    let progress = ProgressBar::new(pending.len() as u64);
    let results: Vec<(String, String, Vec<Descriptor>)> = pending
        .par_iter()
        .map(|(image, hash)| {
            let descriptors = features::extract_from_path(&image.path, config.max_features)?;
            if verbose {
                progress.println(format!(
                    "  抽出: {} ({}記述子)",
                    image.file_name,
                    descriptors.len()
                ));
            }
            progress.inc(1);
            Ok((image.file_name.clone(), hash.clone(), descriptors))
        })
        .collect::<Result<Vec<_>>>()?;
    progress.finish_and_clear();

    let mut extracted = 0usize;
    let mut skipped = 0usize;
    for (file_name, hash, descriptors) in results {
        if descriptors.is_empty() {
            eprintln!("⚠ 特徴が取れないためスキップ: {}", file_name);
            skipped += 1;
            continue;
        }
        extracted += 1;
        store.insert(file_name, hash, descriptors);
    }

    store.touch();
    store.save(&config.descriptors_path())?;

    Ok(ExtractSummary {
        total: images.len(),
        extracted,
        reused,
        skipped,
    })
}

/// 特徴ストアから記述子をサンプリングして視覚辞書を学習・保存する
pub fn run_dictionary(config: &Config) -> Result<Vocabulary> {
    let store = FeatureStore::load_required(&config.descriptors_path())?;
    if store.is_empty() {
        return Err(BofSearchError::NoFeatures("特徴ストアが空です".into()));
    }

    // 画像ごとに最大 samples_per_image 記述子を等確率で選ぶ
    let mut rng = StdRng::seed_from_u64(config.kmeans_seed);
    let mut samples: Vec<Vec<f32>> = Vec::new();
    for (_, entry) in store.iter() {
        if entry.descriptors.len() > config.samples_per_image {
            for index in sample_distinct(entry.descriptors.len(), config.samples_per_image, &mut rng)
            {
                samples.push(entry.descriptors[index].clone());
            }
        } else {
            samples.extend(entry.descriptors.iter().cloned());
        }
    }
    println!("  サンプリング記述子数: {}", samples.len());

    let vocabulary = Vocabulary::train(
        &samples,
        config.vocabulary_size,
        config.kmeans_batch_size,
        config.kmeans_iterations,
        config.kmeans_seed,
    )?;
    vocabulary.save(&config.vocabulary_path())?;
    Ok(vocabulary)
}

/// 特徴ストアと辞書からBoWインデックスを構築・保存する
pub fn run_bow(config: &Config) -> Result<BowIndex> {
    let store = FeatureStore::load_required(&config.descriptors_path())?;
    let vocabulary = Vocabulary::load_required(&config.vocabulary_path())?;

    let index = BowIndex::build(&store, &vocabulary)?;
    index.save(&config.index_path())?;
    Ok(index)
}
