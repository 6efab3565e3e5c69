//! 局所特徴記述子の計算
//!
//! グレースケール画像から勾配方向ヒストグラム記述子（SIFT風、128次元）を
//! 抽出する。回転不変性は持たない（直立パッチ固定）。
//!
//! 手順:
//! 1. 全画素の勾配（中央差分）から強度と方向を計算
//! 2. グリッドの各セルで勾配強度が最大の画素をキーポイント候補にする
//! 3. 強度順に上位 `max_features` 点を選ぶ
//! 4. 各キーポイント周辺の16x16パッチを4x4セルx方向8ビンに集計して
//!    128次元ベクトルにし、L2正規化→0.2クリップ→再正規化する

use bof_search_common::l2_normalize;
use image::DynamicImage;

/// 記述子の次元数（4x4セル x 8方向ビン）
pub const DESCRIPTOR_DIM: usize = 128;

/// 1つの記述子（長さ128）
pub type Descriptor = Vec<f32>;

const PATCH_RADIUS: i64 = 8;
const CELL_SIZE: i64 = 4;
const ORIENTATION_BINS: usize = 8;
/// キーポイント候補を探すグリッドの間隔（画素）
const GRID_STEP: u32 = 8;
/// これ未満の勾配強度はキーポイントにしない
const MIN_MAGNITUDE: f32 = 0.03;
/// 正規化後の成分クリップ値
const CLIP_THRESHOLD: f32 = 0.2;
/// パッチと勾配計算が収まる縁の幅
const BORDER: u32 = (PATCH_RADIUS + 1) as u32;

const TWO_PI: f32 = std::f32::consts::PI * 2.0;

/// 勾配マップ（強度と方向、行優先）
struct GradientMap {
    width: u32,
    height: u32,
    magnitude: Vec<f32>,
    orientation: Vec<f32>,
}

impl GradientMap {
    /// 中央差分で勾配を計算する。縁1画素は強度0のまま。
    fn compute(pixels: &[f32], width: u32, height: u32) -> Self {
        let mut magnitude = vec![0.0f32; pixels.len()];
        let mut orientation = vec![0.0f32; pixels.len()];

        let w = width as usize;
        for y in 1..height.saturating_sub(1) as usize {
            for x in 1..width.saturating_sub(1) as usize {
                let gx = (pixels[y * w + x + 1] - pixels[y * w + x - 1]) * 0.5;
                let gy = (pixels[(y + 1) * w + x] - pixels[(y - 1) * w + x]) * 0.5;

                let index = y * w + x;
                magnitude[index] = (gx * gx + gy * gy).sqrt();

                let mut angle = gy.atan2(gx);
                if angle < 0.0 {
                    angle += TWO_PI;
                }
                orientation[index] = angle;
            }
        }

        Self {
            width,
            height,
            magnitude,
            orientation,
        }
    }

    fn magnitude_at(&self, x: u32, y: u32) -> f32 {
        self.magnitude[(y * self.width + x) as usize]
    }

    fn orientation_at(&self, x: u32, y: u32) -> f32 {
        self.orientation[(y * self.width + x) as usize]
    }
}

/// キーポイント候補
struct Keypoint {
    x: u32,
    y: u32,
    magnitude: f32,
}

/// 画像から最大 `max_features` 個の記述子を抽出する
///
/// 特徴が取れない画像（平坦・極小）では空のVecを返す。
pub fn extract_descriptors(image: &DynamicImage, max_features: usize) -> Vec<Descriptor> {
    let gray = image.to_luma32f();
    let (width, height) = gray.dimensions();

    if width < BORDER * 2 + 1 || height < BORDER * 2 + 1 || max_features == 0 {
        return Vec::new();
    }

    let pixels = gray.into_raw();
    let gradients = GradientMap::compute(&pixels, width, height);

    let mut keypoints = select_keypoints(&gradients);
    // 強度降順（同点は座標順のまま）
    keypoints.sort_by(|a, b| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    keypoints.truncate(max_features);

    keypoints
        .iter()
        .map(|kp| describe_patch(&gradients, kp.x, kp.y))
        .collect()
}

/// グリッドの各セルで勾配強度が最大の画素を候補にする
fn select_keypoints(gradients: &GradientMap) -> Vec<Keypoint> {
    let mut keypoints = Vec::new();

    let mut cell_y = BORDER;
    while cell_y < gradients.height - BORDER {
        let mut cell_x = BORDER;
        while cell_x < gradients.width - BORDER {
            let mut best: Option<Keypoint> = None;

            for y in cell_y..(cell_y + GRID_STEP).min(gradients.height - BORDER) {
                for x in cell_x..(cell_x + GRID_STEP).min(gradients.width - BORDER) {
                    let magnitude = gradients.magnitude_at(x, y);
                    if magnitude < MIN_MAGNITUDE {
                        continue;
                    }
                    if best.as_ref().map_or(true, |b| magnitude > b.magnitude) {
                        best = Some(Keypoint { x, y, magnitude });
                    }
                }
            }

            if let Some(keypoint) = best {
                keypoints.push(keypoint);
            }
            cell_x += GRID_STEP;
        }
        cell_y += GRID_STEP;
    }

    keypoints
}

/// キーポイント周辺の16x16パッチから128次元記述子を作る
fn describe_patch(gradients: &GradientMap, center_x: u32, center_y: u32) -> Descriptor {
    let mut descriptor = vec![0.0f32; DESCRIPTOR_DIM];

    for dy in -PATCH_RADIUS..PATCH_RADIUS {
        for dx in -PATCH_RADIUS..PATCH_RADIUS {
            let x = (center_x as i64 + dx) as u32;
            let y = (center_y as i64 + dy) as u32;

            let magnitude = gradients.magnitude_at(x, y);
            if magnitude == 0.0 {
                continue;
            }

            let cell_row = ((dy + PATCH_RADIUS) / CELL_SIZE) as usize;
            let cell_col = ((dx + PATCH_RADIUS) / CELL_SIZE) as usize;
            // f32の丸めで方向が2πちょうどになるとビン8が出るため抑える
            let bin = (((gradients.orientation_at(x, y) / TWO_PI) * ORIENTATION_BINS as f32)
                as usize)
                .min(ORIENTATION_BINS - 1);

            let index = (cell_row * 4 + cell_col) * ORIENTATION_BINS + bin;
            descriptor[index] += magnitude;
        }
    }

    // SIFT同様: 正規化→クリップ→再正規化で照明変化に強くする
    l2_normalize(&mut descriptor);
    for value in descriptor.iter_mut() {
        if *value > CLIP_THRESHOLD {
            *value = CLIP_THRESHOLD;
        }
    }
    l2_normalize(&mut descriptor);

    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// 市松模様のテスト画像（縁が多く特徴が取れる）
    fn checkerboard(width: u32, height: u32, block: u32) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            if ((x / block) + (y / block)) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    fn flat(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([128u8])))
    }

    #[test]
    fn test_extract_from_textured_image() {
        let descriptors = extract_descriptors(&checkerboard(64, 64, 8), 2000);
        assert!(!descriptors.is_empty());
        for descriptor in &descriptors {
            assert_eq!(descriptor.len(), DESCRIPTOR_DIM);
        }
    }

    #[test]
    fn test_descriptors_are_unit_norm() {
        let descriptors = extract_descriptors(&checkerboard(64, 64, 8), 2000);
        for descriptor in &descriptors {
            let norm = descriptor.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "ノルムが1でない: {}", norm);
        }
    }

    #[test]
    fn test_flat_image_has_no_features() {
        let descriptors = extract_descriptors(&flat(64, 64), 2000);
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_tiny_image_has_no_features() {
        let descriptors = extract_descriptors(&checkerboard(12, 12, 4), 2000);
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_max_features_cap() {
        let descriptors = extract_descriptors(&checkerboard(128, 128, 8), 5);
        assert!(descriptors.len() <= 5);
        assert!(!descriptors.is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let image = checkerboard(64, 64, 8);
        let first = extract_descriptors(&image, 100);
        let second = extract_descriptors(&image, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn test_descriptor_values_in_range() {
        let descriptors = extract_descriptors(&checkerboard(64, 64, 8), 50);
        for descriptor in &descriptors {
            for &value in descriptor {
                assert!((0.0..=1.0 + 1e-4).contains(&value));
            }
        }
    }
}
