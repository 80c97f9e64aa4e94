//! Burnによるモデル学習
//!
//! パイプラインから渡された学習・検証データでCNNを学習し、
//! 推論と保存ができる `BurnModel` を返します。

use std::path::PathBuf;

use burn::{
    backend::{Autodiff, Wgpu},
    data::{
        dataloader::{batcher::Batcher, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::Module,
    optim::AdamConfig,
    tensor::{
        backend::{AutodiffBackend, Backend},
        Int, Tensor,
    },
    train::{
        metric::{AccuracyMetric, LossMetric},
        ClassificationOutput, LearnerBuilder, LearningStrategy, TrainOutput, TrainStep, ValidStep,
    },
};
use burn_wgpu::WgpuDevice;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::dataset::LabeledImage;
use crate::error::{ClassifierError, Result};
use crate::ml::inference::BurnModel;
use crate::ml::ml_model::{ImageClassifier, ModelConfig};
use crate::model::{DeviceType, HyperParameters, ModelMetadata, Preprocessor};
use crate::training::Trainer;

/// 設定からWGPUデバイスを選ぶ
pub fn select_device(device_type: &DeviceType) -> WgpuDevice {
    match device_type {
        DeviceType::Wgpu => WgpuDevice::DiscreteGpu(0),
        DeviceType::Cpu => WgpuDevice::Cpu,
    }
}

/// データセットアイテム（画像パスとラベルの序数のみ保持）
#[derive(Clone, Debug)]
pub struct ImageItem {
    pub path: PathBuf,
    pub label: usize,
}

/// 学習データセット
pub struct ImageDataset {
    items: Vec<ImageItem>,
}

impl ImageDataset {
    /// ラベルを前処理パイプラインの語彙で序数に変換する
    pub fn new(images: &[LabeledImage], preprocessor: &Preprocessor) -> Result<Self> {
        let items = images
            .iter()
            .map(|image| {
                let label = preprocessor.encode_label(&image.label).ok_or_else(|| {
                    ClassifierError::Training(format!("label '{}' is not in the vocabulary", image.label))
                })?;
                Ok(ImageItem {
                    path: image.path.clone(),
                    label,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// バッチャー（画像の読み込みと正規化は前処理パイプラインに任せる）
#[derive(Clone)]
pub struct ImageBatcher {
    preprocessor: Preprocessor,
}

impl ImageBatcher {
    pub fn new(preprocessor: Preprocessor) -> Self {
        Self { preprocessor }
    }
}

/// バッチデータ
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    pub images: Tensor<B, 4>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_size = items.len();
        let size = self.preprocessor.image_size as usize;
        let mut all_pixels = Vec::with_capacity(batch_size * 3 * size * size);
        let mut targets = Vec::with_capacity(batch_size);

        for item in items {
            match self.preprocessor.prepare(&item.path) {
                Ok(prepared) => all_pixels.extend_from_slice(&prepared.pixels),
                Err(e) => {
                    warn!("画像読み込み失敗のためゼロで埋めます: {}", e);
                    all_pixels.extend(std::iter::repeat(0.0f32).take(3 * size * size));
                }
            }
            targets.push(item.label as i64);
        }

        // 1回の転送でバッチ全体をデバイスへ
        let images = Tensor::<B, 1>::from_floats(all_pixels.as_slice(), device).reshape([batch_size, 3, size, size]);
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device);

        ImageBatch { images, targets }
    }
}

impl<B: AutodiffBackend> TrainStep<ImageBatch<B>, ClassificationOutput<B>> for ImageClassifier<B> {
    fn step(&self, batch: ImageBatch<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward_classification(batch.images, batch.targets);
        let grads = item.loss.backward();
        TrainOutput::new(self, grads, item)
    }
}

impl<B: Backend> ValidStep<ImageBatch<B>, ClassificationOutput<B>> for ImageClassifier<B> {
    fn step(&self, batch: ImageBatch<B>) -> ClassificationOutput<B> {
        self.forward_classification(batch.images, batch.targets)
    }
}

/// 学習中のチェックポイント等を置く一時フォルダ
///
/// 実行ごとに別のフォルダになる。
fn learner_artifact_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("image_classification_training").tempdir()?)
}

/// Burn (WGPU) の学習アダプタ
#[derive(Debug, Clone, Default)]
pub struct BurnTrainer {
    pub device_type: DeviceType,
}

impl BurnTrainer {
    pub fn new(device_type: DeviceType) -> Self {
        Self { device_type }
    }
}

impl Trainer for BurnTrainer {
    type Model = BurnModel;

    fn fit(
        &self,
        train: &[LabeledImage],
        validation: &[LabeledImage],
        preprocessor: &Preprocessor,
        hyper_parameters: &HyperParameters,
    ) -> Result<BurnModel> {
        if train.is_empty() {
            return Err(ClassifierError::Training("学習データが見つかりません".into()));
        }

        let dataset_train = ImageDataset::new(train, preprocessor)?;
        // 保留データが少なく検証データが空の場合は学習データで検証する
        let dataset_val = if validation.is_empty() {
            warn!("検証データが空のため、学習データで検証します");
            ImageDataset::new(train, preprocessor)?
        } else {
            ImageDataset::new(validation, preprocessor)?
        };
        info!("学習データ: {} 枚", dataset_train.len());
        info!("検証データ: {} 枚", dataset_val.len());

        let num_classes = preprocessor.vocabulary.len();
        let model_config = ModelConfig::for_architecture(hyper_parameters.architecture, num_classes);
        info!(
            "モデル設定: {} クラス, 入力サイズ: {}x{}, チャネル: {:?}, dropout={}",
            num_classes, preprocessor.image_size, preprocessor.image_size, model_config.widths, model_config.dropout
        );

        let device = select_device(&self.device_type);
        info!("使用デバイス: {:?} ({})", device, self.device_type);

        // データセット分割時にシャッフル済みなのでここではシャッフルしない
        let dataloader_train = DataLoaderBuilder::new(ImageBatcher::new(preprocessor.clone()))
            .batch_size(hyper_parameters.batch_size)
            .num_workers(0)
            .build(dataset_train);
        let dataloader_val = DataLoaderBuilder::new(ImageBatcher::new(preprocessor.clone()))
            .batch_size(hyper_parameters.batch_size)
            .num_workers(0)
            .build(dataset_val);

        let model = model_config.init::<Autodiff<Wgpu>>(&device);

        let artifact_dir = learner_artifact_dir()?;
        let artifact_dir_str = artifact_dir.path().to_string_lossy().to_string();

        info!(
            "エポック数: {}, バッチサイズ: {}, 学習率: {}",
            hyper_parameters.epoch, hyper_parameters.batch_size, hyper_parameters.learning_rate
        );
        let learner = LearnerBuilder::new(&artifact_dir_str)
            .metric_train_numeric(AccuracyMetric::new())
            .metric_valid_numeric(AccuracyMetric::new())
            .metric_train_numeric(LossMetric::new())
            .metric_valid_numeric(LossMetric::new())
            .learning_strategy(LearningStrategy::SingleDevice(device.clone()))
            .num_epochs(hyper_parameters.epoch)
            .summary()
            .build(model, AdamConfig::new().init(), hyper_parameters.learning_rate);

        let trained = learner.fit(dataloader_train, dataloader_val);
        info!("学習が完了しました");

        let artifact_path = artifact_dir.path().to_path_buf();
        if let Err(e) = artifact_dir.close() {
            warn!("学習用一時フォルダを削除できませんでした ({}): {}", artifact_path.display(), e);
        }

        let trained_model: ImageClassifier<Wgpu> = trained.model;
        info!("学習済みモデルの総パラメータ数: {}", trained_model.num_params());

        let metadata = ModelMetadata::new(
            preprocessor.vocabulary.clone(),
            preprocessor.image_size,
            hyper_parameters,
            train.len(),
        );
        Ok(BurnModel::new(trained_model, metadata, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_dir_is_unique_per_run() {
        let a = learner_artifact_dir().unwrap();
        let b = learner_artifact_dir().unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());

        let path = a.path().to_path_buf();
        a.close().unwrap();
        assert!(!path.exists());
        assert!(b.path().is_dir());
    }
}
