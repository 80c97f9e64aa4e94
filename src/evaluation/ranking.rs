//! 推論結果の順位付け
//!
//! スコアベクトルを「ラベル: スコア」の降順リストに変換し、
//! 画像ごとの結果を確信度の高い順に並べます。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::{LabelVocabulary, LabeledImage};
use crate::error::{ClassifierError, Result};

/// 画像ごとに残す上位ラベル数
pub const TOP_K: usize = 10;

/// 高確信度とみなすスコアの下限
pub const HIGH_CONFIDENCE_THRESHOLD: f32 = 0.95;

pub fn is_high_confidence(score: f32) -> bool {
    score >= HIGH_CONFIDENCE_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    /// "97.00%" 形式
    pub fn percent(&self) -> String {
        format!("{:.2}%", self.score * 100.0)
    }
}

/// 1枚分の順位付き推論結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    pub image_path: PathBuf,
    pub file_name: String,
    pub true_label: String,
    pub predicted_label: String,
    pub is_correct: bool,
    pub top_score: f32,
    /// 上位 TOP_K 件（スコア降順、同点は語彙の序数順）
    pub ordered_label_scores: Vec<LabelScore>,
}

// NaN は最下位に回す
fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// スコア降順に並べた序数の列
///
/// 安定ソートなので、同点のラベルは序数の小さい順に並ぶ。
pub fn rank_label_indices(scores: &[f32]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| sort_key(scores[b]).total_cmp(&sort_key(scores[a])));
    indices
}

impl RankedPrediction {
    pub fn from_scores(image: &LabeledImage, scores: &[f32], vocabulary: &LabelVocabulary) -> Result<Self> {
        if scores.is_empty() {
            return Err(ClassifierError::Evaluation(format!(
                "empty score vector for {}",
                image.path.display()
            )));
        }

        let ordered_label_scores = rank_label_indices(scores)
            .into_iter()
            .take(TOP_K)
            .map(|index| {
                let label = vocabulary.label(index).ok_or_else(|| {
                    ClassifierError::Evaluation(format!(
                        "score index {} is outside the label vocabulary ({} labels)",
                        index,
                        vocabulary.len()
                    ))
                })?;
                Ok(LabelScore {
                    label: label.to_string(),
                    score: scores[index],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let top = &ordered_label_scores[0];
        let predicted_label = top.label.clone();
        let top_score = top.score;

        Ok(Self {
            image_path: image.path.clone(),
            file_name: image.file_name(),
            is_correct: predicted_label == image.label,
            true_label: image.label.clone(),
            predicted_label,
            top_score,
            ordered_label_scores,
        })
    }
}

/// 全体を確信度（top_score）の降順に並べる
pub fn rank_globally(mut predictions: Vec<RankedPrediction>) -> Vec<RankedPrediction> {
    predictions.sort_by(|a, b| sort_key(b.top_score).total_cmp(&sort_key(a.top_score)));
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(n: usize) -> LabelVocabulary {
        LabelVocabulary::from_labels((0..n).map(|i| format!("label_{:02}", i)))
    }

    #[test]
    fn test_tied_maxima_pick_lowest_ordinal() {
        let image = LabeledImage::from_path("root/label_02/x.png");
        let scores = [0.1, 0.4, 0.4, 0.1];
        for _ in 0..5 {
            let ranked = RankedPrediction::from_scores(&image, &scores, &vocab(4)).unwrap();
            assert_eq!(ranked.predicted_label, "label_01");
            assert!(!ranked.is_correct);
            let labels: Vec<_> = ranked.ordered_label_scores.iter().map(|s| s.label.as_str()).collect();
            assert_eq!(labels, vec!["label_01", "label_02", "label_00", "label_03"]);
        }
    }

    #[test]
    fn test_top_k_over_twelve_labels() {
        let image = LabeledImage::from_path("root/label_05/x.png");
        let scores: Vec<f32> = vec![0.01, 0.2, 0.03, 0.05, 0.02, 0.3, 0.04, 0.1, 0.06, 0.07, 0.08, 0.04];
        let ranked = RankedPrediction::from_scores(&image, &scores, &vocab(12)).unwrap();

        assert_eq!(ranked.ordered_label_scores.len(), TOP_K);
        assert!(ranked
            .ordered_label_scores
            .windows(2)
            .all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked.predicted_label, "label_05");
        assert_eq!(ranked.top_score, 0.3);
        assert!(ranked.is_correct);
        assert_eq!(ranked.file_name, "x.png");
    }

    #[test]
    fn test_nan_scores_sort_last() {
        assert_eq!(rank_label_indices(&[f32::NAN, 0.2, 0.5]), vec![2, 1, 0]);
    }

    #[test]
    fn test_empty_or_oversized_scores_rejected() {
        let image = LabeledImage::from_path("root/a/x.png");
        assert!(RankedPrediction::from_scores(&image, &[], &vocab(2)).is_err());
        assert!(RankedPrediction::from_scores(&image, &[0.1, 0.2, 0.7], &vocab(2)).is_err());
    }

    #[test]
    fn test_rank_globally_by_top_score_desc_stable() {
        let v = vocab(2);
        let make = |name: &str, s: f32| {
            RankedPrediction::from_scores(&LabeledImage::from_path(format!("r/label_00/{}", name)), &[s, 1.0 - s], &v)
                .unwrap()
        };
        let ranked = rank_globally(vec![make("a", 0.6), make("b", 0.9), make("c", 0.6), make("d", 0.75)]);
        let names: Vec<_> = ranked.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_percent_format() {
        let s = LabelScore { label: "x".into(), score: 0.97 };
        assert_eq!(s.percent(), "97.00%");
        assert!(is_high_confidence(0.95));
        assert!(!is_high_confidence(0.949));
    }
}
