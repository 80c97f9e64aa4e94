//! 学習から評価レポート出力までの一連の処理
//!
//! 1. ハイパーパラメータの検証（I/Oの前）
//! 2. データセットの走査、ラベル語彙の確定、学習・検証・評価への分割
//! 3. 学習アダプタでの学習
//! 4. pipeline.json と model.tar.gz の保存
//! 5. 評価データの推論と集計
//! 6. HTMLレポートの書き出し（最後に書かれる成果物）

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dataset::{discover_images, split_dataset, summarize_by_label, LabelVocabulary};
use crate::error::{ClassifierError, Result};
use crate::evaluation::{evaluate, EvaluationReport};
use crate::model::preprocess::MIN_IMAGE_SIZE;
use crate::model::{HyperParameters, Preprocessor, ResultArtifactSet, RunContext};
use crate::report::render_html;
use crate::scoring::{score_images, FailurePolicy};
use crate::training::{ScoringModel, Trainer};

/// 学習の実行結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingResults {
    pub files: ResultArtifactSet,
    pub train_size: usize,
    pub validation_size: usize,
    pub test_size: usize,
    pub evaluation: EvaluationReport,
}

/// データセットフォルダから分類モデルを作成し、評価レポートを出力する
///
/// フォルダ直下のサブフォルダ名がラベルになる。成果物はすべてフォルダ直下に保存される。
pub fn generate_model<T: Trainer>(
    images_folder: &Path,
    hyper_parameters: &HyperParameters,
    context: RunContext,
    image_size: u32,
    trainer: &T,
) -> Result<TrainingResults> {
    hyper_parameters.validate()?;
    if image_size < MIN_IMAGE_SIZE {
        return Err(ClassifierError::invalid_argument(format!(
            "image_size must be >= {}, got {}",
            MIN_IMAGE_SIZE, image_size
        )));
    }
    if !images_folder.is_dir() {
        return Err(ClassifierError::NotFound(images_folder.to_path_buf()));
    }

    let images = discover_images(images_folder)?;
    info!("画像 {} 枚を検出しました: {}", images.len(), images_folder.display());
    for (label, count) in summarize_by_label(&images) {
        info!("  {}: {}枚", label, count);
    }

    let vocabulary = LabelVocabulary::from_images(&images);
    let preprocessor = Preprocessor::new(vocabulary, image_size);

    let partitions = split_dataset(images, context.seed, hyper_parameters.test_fraction)?;
    info!(
        "データ分割 (seed={}): 学習 {} / 検証 {} / 評価 {}",
        context.seed,
        partitions.train.len(),
        partitions.validation.len(),
        partitions.test.len()
    );
    if partitions.test.is_empty() {
        return Err(ClassifierError::Evaluation(format!(
            "the final test partition is empty ({} images in total)",
            partitions.total()
        )));
    }

    info!("学習を開始します: {}", hyper_parameters.architecture);
    let model = trainer.fit(&partitions.train, &partitions.validation, &preprocessor, hyper_parameters)?;

    let files = ResultArtifactSet::new(images_folder);
    preprocessor.save(&files.pipeline_path)?;
    model.save(&files.model_path)?;
    info!("モデルを保存しました: {}", files.model_path.display());

    let batch = score_images(&model, &preprocessor, &partitions.test, FailurePolicy::Skip)?;
    if batch.failure_count() > 0 {
        warn!("評価データのうち {} 枚を推論できませんでした", batch.failure_count());
    }
    let evaluation = evaluate(&batch, hyper_parameters.results_to_show)?;

    render_html(&evaluation, &files.model_path, &files.report_path)?;

    Ok(TrainingResults {
        files,
        train_size: partitions.train.len(),
        validation_size: partitions.validation.len(),
        test_size: partitions.test.len(),
        evaluation,
    })
}
