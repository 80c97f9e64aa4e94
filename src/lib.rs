// 画像分類（転移学習）のデータ分割・評価レポート機能
#![recursion_limit = "256"]
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod training;

#[cfg(feature = "ml")]
pub mod ml;

pub use error::{ClassifierError, Result};
pub use pipeline::{generate_model, TrainingResults};
