//! 学習済みモデルによる推論と保存・読み込み

use std::path::Path;

use burn::{
    backend::Wgpu,
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::Tensor,
};
use burn_wgpu::WgpuDevice;
use tracing::info;

use crate::dataset::LabelVocabulary;
use crate::error::{ClassifierError, Result};
use crate::ml::ml_model::{ImageClassifier, ModelConfig};
use crate::ml::training::select_device;
use crate::model::{load_model_with_metadata, save_model_with_metadata, DeviceType, ModelMetadata, PreparedImage, Preprocessor};
use crate::scoring::check_compatibility;
use crate::training::ScoringModel;

/// 学習済みモデル
pub struct BurnModel {
    model: ImageClassifier<Wgpu>,
    metadata: ModelMetadata,
    device: WgpuDevice,
}

impl BurnModel {
    pub fn new(model: ImageClassifier<Wgpu>, metadata: ModelMetadata, device: WgpuDevice) -> Self {
        Self { model, metadata, device }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// model.tar.gz からモデルを読み込む
    pub fn load(model_path: &Path, device_type: &DeviceType) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifierError::NotFound(model_path.to_path_buf()));
        }
        let (metadata, model_binary) = load_model_with_metadata(model_path).map_err(ClassifierError::artifact)?;

        let device = select_device(device_type);
        // 推論時はドロップアウトなし
        let model_config = ModelConfig::for_architecture(metadata.architecture, metadata.vocabulary.len()).with_dropout(0.0);
        let model = model_config.init::<Wgpu>(&device);

        let record = BinBytesRecorder::<FullPrecisionSettings>::default()
            .load(model_binary, &device)
            .map_err(|e| ClassifierError::Artifact(format!("モデル重みの読み込みエラー: {:?}", e)))?;

        Ok(Self {
            model: model.load_record(record),
            metadata,
            device,
        })
    }
}

impl ScoringModel for BurnModel {
    fn vocabulary(&self) -> &LabelVocabulary {
        &self.metadata.vocabulary
    }

    fn image_size(&self) -> u32 {
        self.metadata.image_size
    }

    fn score(&self, image: &PreparedImage) -> Result<Vec<f32>> {
        let size = image.size as usize;
        let tensor = Tensor::<Wgpu, 1>::from_floats(image.pixels.as_slice(), &self.device).reshape([1, 3, size, size]);

        self.model
            .forward_softmax(tensor)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ClassifierError::inference(&image.path, format!("推論結果の取得エラー: {:?}", e)))
    }

    fn save(&self, path: &Path) -> Result<()> {
        let model_binary = BinBytesRecorder::<FullPrecisionSettings>::default()
            .record(self.model.clone().into_record(), ())
            .map_err(|e| ClassifierError::Artifact(format!("モデル重みの書き出しエラー: {:?}", e)))?;
        save_model_with_metadata(path, &self.metadata, &model_binary).map_err(ClassifierError::artifact)
    }
}

/// 前処理パイプラインと学習済みモデルを読み込む
///
/// どちらかのファイルが無ければ `NotFound`。語彙が一致しなければ `Inference`。
pub fn load_classifier(
    pipeline_path: &Path,
    model_path: &Path,
    device_type: &DeviceType,
) -> Result<(BurnModel, Preprocessor)> {
    let preprocessor = Preprocessor::load(pipeline_path)?;
    let model = BurnModel::load(model_path, device_type)?;
    check_compatibility(&model, &preprocessor)?;

    info!(
        "モデルを読み込みました: {} ({} クラス)",
        model_path.display(),
        model.vocabulary().len()
    );
    Ok((model, preprocessor))
}
