//! 学習アダプタのインターフェース
//!
//! 特徴抽出と分類ヘッドの学習はこのクレートの外側の責務です。
//! パイプラインは `Trainer::fit` だけを呼び、返ってきたモデルハンドルで
//! 推論と保存を行います。テストでは決まったスコアを返す偽物に差し替えます。

use std::path::Path;

use crate::dataset::{LabelVocabulary, LabeledImage};
use crate::error::Result;
use crate::model::{HyperParameters, PreparedImage, Preprocessor};

/// 学習済みモデルのハンドル
pub trait ScoringModel {
    /// 学習時に確定したラベル語彙
    fn vocabulary(&self) -> &LabelVocabulary;

    /// 学習時の入力サイズ（正方形の一辺）
    fn image_size(&self) -> u32;

    /// 1枚の画像に対して、語彙の全ラベル分のスコアを序数順に返す
    fn score(&self, image: &PreparedImage) -> Result<Vec<f32>>;

    /// モデルをファイルに保存する
    fn save(&self, path: &Path) -> Result<()>;
}

/// 学習アダプタ
///
/// 進捗（ステップごとの指標）はログなどの副チャネルで報告し、戻り値には含めない。
pub trait Trainer {
    type Model: ScoringModel;

    fn fit(
        &self,
        train: &[LabeledImage],
        validation: &[LabeledImage],
        preprocessor: &Preprocessor,
        hyper_parameters: &HyperParameters,
    ) -> Result<Self::Model>;
}
