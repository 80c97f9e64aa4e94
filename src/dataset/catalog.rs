//! データセットの画像カタログ
//!
//! ルートディレクトリ以下を再帰的に走査し、画像ファイルと
//! 親ディレクトリ名（ラベル）の組を列挙します。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ClassifierError, Result};

/// 対象とする画像拡張子（大文字小文字は区別しない）
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

/// ラベル付き画像
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabeledImage {
    /// 画像ファイルのパス
    pub path: PathBuf,
    /// ラベル（画像の直上のディレクトリ名）
    pub label: String,
}

impl LabeledImage {
    /// パスからラベル付き画像を作成（ラベルは親ディレクトリ名）
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = parent_dir_name(&path).unwrap_or_default();
        Self { path, label }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 画像拡張子かどうか
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn parent_dir_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
}

/// ルートディレクトリ以下の画像をすべて列挙する
///
/// 深さ制限なしで走査します。呼び出し側は列挙順に依存してはいけませんが、
/// 同じディレクトリ構成なら毎回同じ順序（ファイル名順）で返します。
pub fn discover_images(root: &Path) -> Result<Vec<LabeledImage>> {
    if !root.is_dir() {
        return Err(ClassifierError::NotFound(root.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("走査できないエントリをスキップしました: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_image_file(entry.path()) {
            continue;
        }

        if let Some(label) = parent_dir_name(entry.path()) {
            images.push(LabeledImage {
                path: entry.into_path(),
                label,
            });
        }
    }

    Ok(images)
}

/// ラベルごとの画像枚数
pub fn summarize_by_label(images: &[LabeledImage]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for image in images {
        *counts.entry(image.label.clone()).or_insert(0) += 1;
    }
    counts
}
