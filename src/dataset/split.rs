//! 決定的なシャッフルとデータセット分割
//!
//! 同じシードと同じ入力順なら、常に同じ並び・同じ分割になります。
//! 3分割は「学習 / 検証+評価」の2分割を2回適用して作ります。
//!
//! ```text
//! 全体 ──(test_fraction)──> 学習 (1 - test_fraction)
//!                        └─> 保留 (test_fraction) ──(0.2)──> 検証 (80%)
//!                                                       └─> 評価 (20%)
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClassifierError, Result};

use super::catalog::LabeledImage;

/// 保留データのうち評価データに回す割合
pub const FINAL_TEST_FRACTION: f64 = 0.2;

/// 学習・検証・評価の3分割
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPartitions {
    pub train: Vec<LabeledImage>,
    pub validation: Vec<LabeledImage>,
    pub test: Vec<LabeledImage>,
}

impl DatasetPartitions {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

/// 割合が (0, 1) の開区間にあるか検証する
pub fn validate_fraction(test_fraction: f64) -> Result<()> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(ClassifierError::invalid_argument(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    Ok(())
}

/// シード付き乱数でレコードを並び替える
pub fn shuffle_records<T>(mut records: Vec<T>, seed: u64) -> Vec<T> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    records.shuffle(&mut rng);
    records
}

/// 2分割のプリミティブ（インデックスで切るだけで再シャッフルはしない）
///
/// 後半 `round(n * test_fraction)` 件をテスト側とする。
pub fn train_test_split<T>(mut records: Vec<T>, test_fraction: f64) -> Result<(Vec<T>, Vec<T>)> {
    validate_fraction(test_fraction)?;

    let total = records.len();
    let test_len = ((total as f64) * test_fraction).round() as usize;
    let train_len = total - test_len.min(total);

    let test = records.split_off(train_len);
    Ok((records, test))
}

/// データセットを学習・検証・評価に分割する
///
/// 保留データが2件未満の場合、検証または評価のどちらかが空になり得る。
pub fn split_dataset(
    records: Vec<LabeledImage>,
    seed: u64,
    test_fraction: f64,
) -> Result<DatasetPartitions> {
    validate_fraction(test_fraction)?;

    let shuffled = shuffle_records(records, seed);
    let (train, holdout) = train_test_split(shuffled, test_fraction)?;
    let (validation, test) = train_test_split(holdout, FINAL_TEST_FRACTION)?;

    debug!(
        "分割結果: 学習 {} / 検証 {} / 評価 {}",
        train.len(),
        validation.len(),
        test.len()
    );

    Ok(DatasetPartitions {
        train,
        validation,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn catalog(n: usize) -> Vec<LabeledImage> {
        (0..n)
            .map(|i| LabeledImage::from_path(format!("root/label_{}/img_{:03}.png", i % 4, i)))
            .collect()
    }

    #[test]
    fn test_default_fraction_gives_70_24_6() {
        let parts = split_dataset(catalog(100), 1, 0.3).unwrap();
        assert_eq!(parts.train.len(), 70);
        assert_eq!(parts.validation.len(), 24);
        assert_eq!(parts.test.len(), 6);
    }

    #[test]
    fn test_split_proportions_within_rounding() {
        for n in 10..250 {
            let parts = split_dataset(catalog(n), 7, 0.3).unwrap();
            let nf = n as f64;
            assert_eq!(parts.total(), n);
            assert!((parts.train.len() as f64 - 0.7 * nf).abs() <= 1.0, "n={}", n);
            assert!((parts.validation.len() as f64 - 0.24 * nf).abs() <= 1.5, "n={}", n);
            assert!((parts.test.len() as f64 - 0.06 * nf).abs() <= 1.0, "n={}", n);
        }
    }

    #[test]
    fn test_same_seed_same_partitions() {
        let a = split_dataset(catalog(57), 42, 0.3).unwrap();
        let b = split_dataset(catalog(57), 42, 0.3).unwrap();
        assert_eq!(a, b);

        let c = split_dataset(catalog(57), 43, 0.3).unwrap();
        assert_ne!(a.train, c.train);
    }

    #[test]
    fn test_partitions_are_exhaustive_and_disjoint() {
        let input = catalog(83);
        let parts = split_dataset(input.clone(), 3, 0.3).unwrap();

        let mut seen = HashSet::new();
        for image in parts.train.iter().chain(&parts.validation).chain(&parts.test) {
            assert!(seen.insert(image.clone()), "duplicate {:?}", image.path);
        }
        let expected: HashSet<_> = input.into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_split_cuts_by_index_without_reshuffle() {
        let (train, test) = train_test_split((0..10).collect::<Vec<_>>(), 0.3).unwrap();
        assert_eq!(train, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(test, vec![7, 8, 9]);
    }

    #[test]
    fn test_tiny_holdout_may_leave_a_partition_empty() {
        let parts = split_dataset(catalog(3), 1, 0.3).unwrap();
        assert_eq!(parts.total(), 3);
        assert_eq!(parts.train.len(), 2);
        assert_eq!(parts.validation.len() + parts.test.len(), 1);
        assert!(parts.test.is_empty());
    }

    #[test]
    fn test_empty_catalog_splits_to_empty() {
        let parts = split_dataset(Vec::new(), 1, 0.3).unwrap();
        assert_eq!(parts.total(), 0);
    }

    #[test]
    fn test_fraction_out_of_range_rejected() {
        for bad in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let err = split_dataset(catalog(10), 1, bad).unwrap_err();
            assert!(matches!(err, ClassifierError::InvalidArgument(_)), "{}", bad);
        }
    }
}
