//! 評価データの推論結果の集計
//!
//! 評価指標は評価データ全体から、確信度の集計はレポートに表示する
//! 上位 `results_to_show` 件から求めます。

pub mod metrics;
pub mod ranking;

pub use metrics::{ClassificationMetrics, ConfidenceSummary, ConfusionMatrix, PerClassValue};
pub use ranking::{
    is_high_confidence, rank_globally, rank_label_indices, LabelScore, RankedPrediction, HIGH_CONFIDENCE_THRESHOLD,
    TOP_K,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifierError, Result};
use crate::scoring::ScoreBatch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub metrics: ClassificationMetrics,
    pub confidence: ConfidenceSummary,
    /// 確信度の降順に並べて表示件数に切り詰めた一覧
    pub results: Vec<RankedPrediction>,
    /// 推論に成功した枚数
    pub evaluated: usize,
    /// 推論に失敗してスキップした枚数
    pub skipped: usize,
}

pub fn evaluate(batch: &ScoreBatch, results_to_show: usize) -> Result<EvaluationReport> {
    if results_to_show == 0 {
        return Err(ClassifierError::invalid_argument("results_to_show must be greater than 0"));
    }

    let evaluated = batch.scored_count();
    if evaluated == 0 {
        return Err(ClassifierError::Evaluation(format!(
            "no successfully scored images ({} failed)",
            batch.failure_count()
        )));
    }

    let metrics = ClassificationMetrics::compute(batch.scored(), &batch.vocabulary)?;

    let ranked = batch
        .scored()
        .map(|s| RankedPrediction::from_scores(&s.image, &s.scores, &batch.vocabulary))
        .collect::<Result<Vec<_>>>()?;
    let mut results = rank_globally(ranked);
    results.truncate(results_to_show);

    let confidence = ConfidenceSummary::from_ranked(&results)?;
    debug!(
        "評価: {}枚 (表示 {}件, 正解 {}件, 高確信度 {}件)",
        evaluated, confidence.shown, confidence.correct_count, confidence.high_confidence_count
    );

    Ok(EvaluationReport {
        metrics,
        confidence,
        results,
        evaluated,
        skipped: batch.failure_count(),
    })
}
