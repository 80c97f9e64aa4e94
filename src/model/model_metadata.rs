//! モデルメタデータの定義
//!
//! tar.gz形式でモデルと一緒に保存され、推論時にラベル語彙や入力サイズを
//! 復元するために使います。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::LabelVocabulary;
use crate::model::hyper_parameter::{Architecture, HyperParameters};

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.bin: モデルの重み（バイナリ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// 学習時に確定したラベル語彙（序数順）
    pub vocabulary: LabelVocabulary,

    /// 転移学習モデルの種類
    pub architecture: Architecture,

    /// モデル入力サイズ（正方形）
    pub image_size: u32,

    pub num_epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,

    /// 学習に使った枚数
    #[serde(default)]
    pub train_samples: usize,

    /// モデルの学習時刻（ISO8601形式）
    pub trained_at: String,
}

impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(
        vocabulary: LabelVocabulary,
        image_size: u32,
        hyper_parameters: &HyperParameters,
        train_samples: usize,
    ) -> Self {
        Self {
            vocabulary,
            architecture: hyper_parameters.architecture,
            image_size,
            num_epochs: hyper_parameters.epoch,
            batch_size: hyper_parameters.batch_size,
            learning_rate: hyper_parameters.learning_rate,
            train_samples,
            trained_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}
