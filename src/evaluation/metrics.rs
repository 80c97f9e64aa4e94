//! 評価指標の計算
//!
//! 評価データ全体の混同行列から多クラス分類の指標を求めます。
//! 確信度の集計は、全体順位で並べて表示件数に切り詰めた一覧に対して行います。

use serde::{Deserialize, Serialize};

use super::ranking::{is_high_confidence, rank_label_indices, RankedPrediction};
use crate::dataset::LabelVocabulary;
use crate::error::{ClassifierError, Result};
use crate::scoring::ScoreVector;

/// log(0) を避けるための下限
const MIN_PROBABILITY: f64 = 1e-15;

/// 混同行列（行: 正解ラベル、列: 予測ラベル）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    pub fn record(&mut self, actual: usize, predicted: usize) {
        self.counts[actual][predicted] += 1;
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|c| self.counts[c][c]).sum()
    }

    /// 正解がそのクラスである件数
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// そのクラスと予測された件数
    pub fn predicted_count(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    pub fn precision(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.predicted_count(class))
    }

    pub fn recall(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.support(class))
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerClassValue {
    pub label: String,
    pub value: f64,
}

fn per_class_values(vocabulary: &LabelVocabulary, value: impl Fn(usize) -> f64) -> Vec<PerClassValue> {
    vocabulary
        .labels()
        .iter()
        .enumerate()
        .map(|(c, label)| PerClassValue {
            label: label.clone(),
            value: value(c),
        })
        .collect()
}

/// 多クラス分類の評価指標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub micro_accuracy: f64,
    pub macro_accuracy: f64,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub log_loss: f64,
    pub log_loss_reduction: f64,
    /// 語彙の序数順
    pub per_class_precision: Vec<PerClassValue>,
    /// 語彙の序数順
    pub per_class_recall: Vec<PerClassValue>,
}

impl ClassificationMetrics {
    pub fn compute<'a, I>(samples: I, vocabulary: &LabelVocabulary) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ScoreVector>,
    {
        let num_classes = vocabulary.len();
        let mut matrix = ConfusionMatrix::new(num_classes);
        let mut loss_sum = 0.0;

        for sample in samples {
            let actual = vocabulary.index_of(&sample.image.label).ok_or_else(|| {
                ClassifierError::Evaluation(format!(
                    "label '{}' of {} is not in the vocabulary",
                    sample.image.label,
                    sample.image.path.display()
                ))
            })?;
            if sample.scores.len() != num_classes {
                return Err(ClassifierError::Evaluation(format!(
                    "{} scores for {} labels ({})",
                    sample.scores.len(),
                    num_classes,
                    sample.image.path.display()
                )));
            }
            let predicted = rank_label_indices(&sample.scores)[0];
            matrix.record(actual, predicted);

            let p_true = (sample.scores[actual] as f64).max(MIN_PROBABILITY);
            loss_sum -= p_true.ln();
        }

        let total = matrix.total();
        if total == 0 {
            return Err(ClassifierError::Evaluation("no scored samples to evaluate".into()));
        }

        let present: Vec<usize> = (0..num_classes).filter(|&c| matrix.support(c) > 0).collect();
        let mean_recall = mean(present.iter().map(|&c| matrix.recall(c)));
        let mean_precision = mean(present.iter().map(|&c| matrix.precision(c)));

        let log_loss = loss_sum / total as f64;
        // 評価データのラベル分布のエントロピー
        let prior: f64 = present
            .iter()
            .map(|&c| {
                let p = matrix.support(c) as f64 / total as f64;
                -p * p.ln()
            })
            .sum();
        let log_loss_reduction = if prior > 0.0 { (prior - log_loss) / prior } else { 0.0 };

        Ok(Self {
            micro_accuracy: ratio(matrix.correct(), total),
            macro_accuracy: mean_recall,
            mean_precision,
            mean_recall,
            log_loss,
            log_loss_reduction,
            per_class_precision: per_class_values(vocabulary, |c| matrix.precision(c)),
            per_class_recall: per_class_values(vocabulary, |c| matrix.recall(c)),
        })
    }
}

/// 表示対象の一覧に対する確信度の集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub shown: usize,
    pub correct_count: usize,
    pub high_confidence_count: usize,
    pub correct_high_confidence_count: usize,
    pub overall_accuracy: f64,
    /// 高確信度の結果が1件もなければ None
    pub high_confidence_accuracy: Option<f64>,
}

impl ConfidenceSummary {
    /// `results` は全体順位で並べて表示件数に切り詰めたもの
    pub fn from_ranked(results: &[RankedPrediction]) -> Result<Self> {
        if results.is_empty() {
            return Err(ClassifierError::Evaluation("no predictions to summarize".into()));
        }

        let shown = results.len();
        let correct_count = results.iter().filter(|r| r.is_correct).count();
        let high: Vec<&RankedPrediction> = results.iter().filter(|r| is_high_confidence(r.top_score)).collect();
        let high_confidence_count = high.len();
        let correct_high_confidence_count = high.iter().filter(|r| r.is_correct).count();

        let high_confidence_accuracy = if high_confidence_count == 0 {
            None
        } else {
            Some(correct_high_confidence_count as f64 / high_confidence_count as f64)
        };

        Ok(Self {
            shown,
            correct_count,
            high_confidence_count,
            correct_high_confidence_count,
            overall_accuracy: correct_count as f64 / shown as f64,
            high_confidence_accuracy,
        })
    }
}
