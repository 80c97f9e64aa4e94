//! 学習済みモデルによる画像の分類

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::{discover_images, LabeledImage};
use crate::error::Result;
use crate::evaluation::{rank_globally, RankedPrediction};
use crate::model::Preprocessor;
use crate::scoring::{check_compatibility, score_image, score_images, FailurePolicy};
use crate::training::ScoringModel;

/// 1枚分の分類結果（最上位ラベルのみ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub file_name: String,
    pub predicted_label: String,
    pub score: f32,
}

impl From<&RankedPrediction> for PredictionResult {
    fn from(p: &RankedPrediction) -> Self {
        Self {
            file_name: p.file_name.clone(),
            predicted_label: p.predicted_label.clone(),
            score: p.top_score,
        }
    }
}

/// 1枚の画像を分類し、上位ラベルの一覧まで含めて返す
///
/// 正解ラベルは親フォルダ名として扱う。
pub fn classify_image_detailed<M: ScoringModel + ?Sized>(
    model: &M,
    preprocessor: &Preprocessor,
    image_path: &Path,
) -> Result<RankedPrediction> {
    check_compatibility(model, preprocessor)?;
    let image = LabeledImage::from_path(image_path);
    let scored = score_image(model, preprocessor, &image)?;
    RankedPrediction::from_scores(&scored.image, &scored.scores, &preprocessor.vocabulary)
}

pub fn classify_single_image<M: ScoringModel + ?Sized>(
    model: &M,
    preprocessor: &Preprocessor,
    image_path: &Path,
) -> Result<PredictionResult> {
    let detailed = classify_image_detailed(model, preprocessor, image_path)?;
    Ok(PredictionResult::from(&detailed))
}

/// フォルダ内の画像をまとめて分類し、確信度の高い順に返す
///
/// 読み込めない画像は警告を出して飛ばす。
pub fn classify_folder<M: ScoringModel + ?Sized>(
    model: &M,
    preprocessor: &Preprocessor,
    folder: &Path,
) -> Result<Vec<RankedPrediction>> {
    let images = discover_images(folder)?;
    let batch = score_images(model, preprocessor, &images, FailurePolicy::Skip)?;

    let ranked = batch
        .scored()
        .map(|s| RankedPrediction::from_scores(&s.image, &s.scores, &batch.vocabulary))
        .collect::<Result<Vec<_>>>()?;
    Ok(rank_globally(ranked))
}
