//! エラー型の定義
//!
//! パイプライン全体で共通のエラー型を thiserror で定義します。
//! どのエラーもリトライせず、そのまま呼び出し元に返します。

use std::path::PathBuf;

use thiserror::Error;

/// 画像分類パイプラインのエラー
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// データセットのルートやモデルファイルが存在しない
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// ハイパーパラメータなどの引数が範囲外
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 画像の読み込み失敗、またはモデルと前処理パイプラインの不整合
    #[error("Inference failed for '{path}': {reason}")]
    Inference { path: PathBuf, reason: String },

    /// 評価データが空など、評価指標を計算できない
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// レポート書き出し中のI/O失敗（部分的なファイルが残る可能性あり）
    #[error("Failed to render report: {0}")]
    Render(String),

    /// 学習アダプタ側の失敗
    #[error("Training error: {0}")]
    Training(String),

    /// モデル・パイプラインファイルのシリアライズ/デシリアライズ失敗
    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// パイプライン共通のResult型
pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn inference(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Inference {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn artifact(err: impl std::fmt::Display) -> Self {
        Self::Artifact(err.to_string())
    }
}
