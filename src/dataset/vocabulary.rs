//! ラベル語彙（序数 ⇔ ラベル名）
//!
//! 学習データのラベル列をエンコードした時点で一度だけ確定し、
//! 以降のスコアベクトルはすべてこの序数に揃えて扱います。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::catalog::LabeledImage;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    /// カタログからラベル語彙を作成（値の昇順で序数を割り当てる）
    pub fn from_images(images: &[LabeledImage]) -> Self {
        let labels: BTreeSet<&str> = images.iter().map(|i| i.label.as_str()).collect();
        Self {
            labels: labels.into_iter().map(str::to_string).collect(),
        }
    }

    /// 指定された順序のままラベル語彙を作成
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}
