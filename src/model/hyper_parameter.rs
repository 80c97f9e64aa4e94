//! 学習ハイパーパラメータ

use serde::{Deserialize, Serialize};

use crate::dataset::split::validate_fraction;
use crate::error::{ClassifierError, Result};

/// 転移学習モデルの選択
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Architecture {
    ResnetV2101,
    InceptionV3,
    MobilenetV2,
    #[default]
    ResnetV250,
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::ResnetV2101 => write!(f, "ResNet v2 101"),
            Architecture::InceptionV3 => write!(f, "Inception v3"),
            Architecture::MobilenetV2 => write!(f, "MobileNet v2"),
            Architecture::ResnetV250 => write!(f, "ResNet v2 50"),
        }
    }
}

/// ハイパーパラメータ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParameters {
    /// エポック数（世代数）：学習させる回数
    pub epoch: usize,
    /// バッチサイズ：１度に学習させるデータの数
    pub batch_size: usize,
    /// 学習率：学習が進むスピード
    pub learning_rate: f64,
    /// 転移学習モデルの選択
    pub architecture: Architecture,
    /// 学習・検証/評価の分割比率。0.3の場合は70%が学習データで、残りが検証/評価データとなる。
    pub test_fraction: f64,
    /// レポートに表示する評価結果の件数（確信度の高い順）
    pub results_to_show: usize,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            epoch: 200,
            batch_size: 10,
            learning_rate: 0.01,
            architecture: Architecture::default(),
            test_fraction: 0.3,
            results_to_show: 30,
        }
    }
}

impl HyperParameters {
    /// 範囲外の値がないか検証する（学習やI/Oの前に呼ぶ）
    pub fn validate(&self) -> Result<()> {
        if self.epoch == 0 {
            return Err(ClassifierError::invalid_argument("epoch must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(ClassifierError::invalid_argument("batch_size must be > 0"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ClassifierError::invalid_argument(format!(
                "learning_rate must be > 0, got {}",
                self.learning_rate
            )));
        }
        if self.results_to_show == 0 {
            return Err(ClassifierError::invalid_argument("results_to_show must be > 0"));
        }
        validate_fraction(self.test_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let hp = HyperParameters::default();
        assert_eq!(hp.epoch, 200);
        assert_eq!(hp.batch_size, 10);
        assert_eq!(hp.learning_rate, 0.01);
        assert_eq!(hp.architecture, Architecture::ResnetV250);
        assert_eq!(hp.test_fraction, 0.3);
        assert!(hp.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let cases = [
            HyperParameters { epoch: 0, ..Default::default() },
            HyperParameters { batch_size: 0, ..Default::default() },
            HyperParameters { learning_rate: 0.0, ..Default::default() },
            HyperParameters { learning_rate: f64::NAN, ..Default::default() },
            HyperParameters { test_fraction: 1.0, ..Default::default() },
            HyperParameters { results_to_show: 0, ..Default::default() },
        ];
        for hp in cases {
            assert!(
                matches!(hp.validate(), Err(ClassifierError::InvalidArgument(_))),
                "{:?}",
                hp
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let hp: HyperParameters = serde_json::from_str(r#"{"epoch": 5, "architecture": "MobilenetV2"}"#).unwrap();
        assert_eq!(hp.epoch, 5);
        assert_eq!(hp.architecture, Architecture::MobilenetV2);
        assert_eq!(hp.batch_size, 10);
    }
}
