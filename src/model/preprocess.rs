//! データ準備パイプライン
//!
//! ラベル列のエンコード（ラベル語彙）と、画像パスから正規化済み画素への変換を
//! ひとまとめにしたものです。学習時に確定し、`pipeline.json` として保存されます。
//! 推論時は同じファイルを読み込んで使います。

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::dataset::LabelVocabulary;
use crate::error::{ClassifierError, Result};

/// ImageNetの平均
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNetの標準偏差
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 入力サイズの下限
///
/// 2回の2x2プーリングの後に1画素以上残る大きさ。
pub const MIN_IMAGE_SIZE: u32 = 4;

/// 前処理済み画像
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub path: PathBuf,
    /// 一辺のサイズ
    pub size: u32,
    /// 正規化されたRGB画像データ (C, H, W) の順で平坦化
    pub pixels: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub vocabulary: LabelVocabulary,
    pub image_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Preprocessor {
    pub fn new(vocabulary: LabelVocabulary, image_size: u32) -> Self {
        Self {
            vocabulary,
            image_size,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// ラベル名を序数に変換
    pub fn encode_label(&self, label: &str) -> Option<usize> {
        self.vocabulary.index_of(label)
    }

    /// 画像を読み込んでリサイズ・正規化する
    ///
    /// 読み込めない画像は `Inference` エラーになる。
    pub fn prepare(&self, path: &Path) -> Result<PreparedImage> {
        let img = image::open(path).map_err(|e| ClassifierError::inference(path, e))?;
        let size = self.image_size;
        let rgb = img.resize_exact(size, size, FilterType::Triangle).to_rgb8();

        let num_pixels = (size * size) as usize;
        let mut pixels = vec![0.0f32; 3 * num_pixels];
        for (i, pixel) in rgb.pixels().enumerate() {
            for channel in 0..3 {
                let value = pixel[channel] as f32 / 255.0;
                pixels[channel * num_pixels + i] = (value - self.mean[channel]) / self.std[channel];
            }
        }

        Ok(PreparedImage {
            path: path.to_path_buf(),
            size,
            pixels,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(ClassifierError::artifact)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ClassifierError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(ClassifierError::artifact)
    }
}
