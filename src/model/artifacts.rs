//! 学習結果として保存されるファイルのパス
//!
//! - model.tar.gz   : 学習済みモデル（推論時に必要）
//! - pipeline.json  : データ準備パイプライン（推論時にモデルと一緒に必要）
//! - resultYYYYMMDDhhmmss.html : 評価レポート（実行ごとに別名）

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const MODEL_FILE_NAME: &str = "model.tar.gz";
pub const PIPELINE_FILE_NAME: &str = "pipeline.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultArtifactSet {
    /// 学習済みモデルの保存先（データセットフォルダ直下）
    pub model_path: PathBuf,
    /// データ準備パイプラインの保存先（データセットフォルダ直下）
    pub pipeline_path: PathBuf,
    /// 評価レポートの保存先
    pub report_path: PathBuf,
}

impl ResultArtifactSet {
    pub fn new(images_folder: &Path) -> Self {
        Self::with_timestamp(images_folder, Local::now())
    }

    pub fn with_timestamp(images_folder: &Path, timestamp: DateTime<Local>) -> Self {
        Self {
            model_path: images_folder.join(MODEL_FILE_NAME),
            pipeline_path: images_folder.join(PIPELINE_FILE_NAME),
            report_path: images_folder.join(format!("result{}.html", timestamp.format("%Y%m%d%H%M%S"))),
        }
    }
}
