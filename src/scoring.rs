//! 推論スコアの計算
//!
//! 学習済みモデルと前処理パイプラインで画像群を推論し、
//! 入力順のまま1枚ごとのスコアベクトルを返します。

use std::path::PathBuf;

use tracing::warn;

use crate::dataset::{LabelVocabulary, LabeledImage};
use crate::error::{ClassifierError, Result};
use crate::model::Preprocessor;
use crate::training::ScoringModel;

/// 1枚分のスコア（語彙の序数順）
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVector {
    pub image: LabeledImage,
    pub scores: Vec<f32>,
}

/// 推論に失敗した画像の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// 最初の失敗でバッチ全体をエラーにする
    Abort,
    /// 失敗をログに出し、バッチ内に記録して続行する
    #[default]
    Skip,
}

/// スコアベクトルのバッチ
///
/// ラベル名に戻せるよう、学習時のラベル語彙を常に一緒に持ち回る。
#[derive(Debug)]
pub struct ScoreBatch {
    pub vocabulary: LabelVocabulary,
    /// 入力順。失敗した画像はエラーのまま残す
    pub entries: Vec<Result<ScoreVector>>,
}

impl ScoreBatch {
    pub fn scored(&self) -> impl Iterator<Item = &ScoreVector> {
        self.entries.iter().filter_map(|e| e.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ClassifierError> {
        self.entries.iter().filter_map(|e| e.as_ref().err())
    }

    pub fn scored_count(&self) -> usize {
        self.scored().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// モデルと前処理パイプラインのラベル語彙・入力サイズが一致するか確認する
pub fn check_compatibility<M: ScoringModel + ?Sized>(model: &M, preprocessor: &Preprocessor) -> Result<()> {
    if model.vocabulary() != &preprocessor.vocabulary {
        return Err(ClassifierError::inference(
            PathBuf::new(),
            format!(
                "vocabulary mismatch: model has [{}], pipeline has [{}]",
                model.vocabulary().labels().join(", "),
                preprocessor.vocabulary.labels().join(", ")
            ),
        ));
    }
    if model.image_size() != preprocessor.image_size {
        return Err(ClassifierError::inference(
            PathBuf::new(),
            format!(
                "image size mismatch: model expects {}, pipeline produces {}",
                model.image_size(),
                preprocessor.image_size
            ),
        ));
    }
    Ok(())
}

/// 1枚の画像を推論する
///
/// 語彙の互換性は呼び出し側で確認済みであること。
pub fn score_image<M: ScoringModel + ?Sized>(
    model: &M,
    preprocessor: &Preprocessor,
    image: &LabeledImage,
) -> Result<ScoreVector> {
    let prepared = preprocessor.prepare(&image.path)?;
    let scores = model.score(&prepared)?;

    let expected = preprocessor.vocabulary.len();
    if scores.len() != expected {
        return Err(ClassifierError::inference(
            &image.path,
            format!("model returned {} scores for {} labels", scores.len(), expected),
        ));
    }

    Ok(ScoreVector {
        image: image.clone(),
        scores,
    })
}

/// 画像群を推論する
pub fn score_images<M: ScoringModel + ?Sized>(
    model: &M,
    preprocessor: &Preprocessor,
    images: &[LabeledImage],
    policy: FailurePolicy,
) -> Result<ScoreBatch> {
    check_compatibility(model, preprocessor)?;

    let mut entries = Vec::with_capacity(images.len());
    for image in images {
        let entry = match score_image(model, preprocessor, image) {
            Ok(scored) => Ok(scored),
            Err(e) if policy == FailurePolicy::Abort => return Err(e),
            Err(e) => {
                warn!("推論に失敗したためスキップします: {}", e);
                Err(e)
            }
        };
        entries.push(entry);
    }

    Ok(ScoreBatch {
        vocabulary: preprocessor.vocabulary.clone(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PreparedImage;
    use image::{Rgb, RgbImage};
    use std::path::Path;

    /// 画像の左上画素の赤成分が大きいほど1番目のラベルのスコアが高くなる偽モデル
    struct RedModel {
        vocabulary: LabelVocabulary,
        width: usize,
    }

    impl ScoringModel for RedModel {
        fn vocabulary(&self) -> &LabelVocabulary {
            &self.vocabulary
        }

        fn image_size(&self) -> u32 {
            2
        }

        fn score(&self, image: &PreparedImage) -> Result<Vec<f32>> {
            let red = if image.pixels[0] > 0.0 { 0.75 } else { 0.25 };
            let mut scores = vec![0.0; self.width];
            scores[0] = red;
            scores[1] = 1.0 - red;
            Ok(scores)
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn write_png(path: &Path, color: [u8; 3]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(4, 4, Rgb(color)).save(path).unwrap();
    }

    fn vocab() -> LabelVocabulary {
        LabelVocabulary::from_labels(["red", "blue"])
    }

    #[test]
    fn test_scores_preserve_input_order_and_skip_failures() {
        let dir = tempfile::tempdir().unwrap();
        let red = dir.path().join("red/r.png");
        let blue = dir.path().join("blue/b.png");
        let broken = dir.path().join("blue/broken.png");
        write_png(&red, [255, 0, 0]);
        write_png(&blue, [0, 0, 255]);
        std::fs::write(&broken, b"nope").unwrap();

        let images = vec![
            LabeledImage::from_path(&blue),
            LabeledImage::from_path(&broken),
            LabeledImage::from_path(&red),
        ];
        let model = RedModel { vocabulary: vocab(), width: 2 };
        let pre = Preprocessor::new(vocab(), 2);

        let batch = score_images(&model, &pre, &images, FailurePolicy::Skip).unwrap();
        assert_eq!(batch.entries.len(), 3);
        assert_eq!(batch.scored_count(), 2);
        assert_eq!(batch.failure_count(), 1);
        assert_eq!(batch.vocabulary, vocab());

        let scored: Vec<_> = batch.scored().collect();
        assert_eq!(scored[0].image.label, "blue");
        assert_eq!(scored[0].scores, vec![0.25, 0.75]);
        assert_eq!(scored[1].image.label, "red");
        assert!(matches!(batch.entries[1], Err(ClassifierError::Inference { .. })));
    }

    #[test]
    fn test_abort_policy_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("red/broken.png");
        std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
        std::fs::write(&broken, b"nope").unwrap();

        let model = RedModel { vocabulary: vocab(), width: 2 };
        let pre = Preprocessor::new(vocab(), 2);
        let result = score_images(&model, &pre, &[LabeledImage::from_path(&broken)], FailurePolicy::Abort);
        assert!(matches!(result, Err(ClassifierError::Inference { .. })));
    }

    #[test]
    fn test_vocabulary_mismatch_rejected() {
        let model = RedModel {
            vocabulary: LabelVocabulary::from_labels(["blue", "red"]),
            width: 2,
        };
        let pre = Preprocessor::new(vocab(), 2);
        let err = score_images(&model, &pre, &[], FailurePolicy::Skip).unwrap_err();
        assert!(err.to_string().contains("vocabulary mismatch"));
    }

    #[test]
    fn test_image_size_mismatch_rejected() {
        let model = RedModel { vocabulary: vocab(), width: 2 };
        let pre = Preprocessor::new(vocab(), 8);
        let err = score_images(&model, &pre, &[], FailurePolicy::Skip).unwrap_err();
        assert!(err.to_string().contains("image size mismatch"));
        assert!(check_compatibility(&model, &Preprocessor::new(vocab(), 2)).is_ok());
    }

    #[test]
    fn test_wrong_score_width_is_entry_failure() {
        let dir = tempfile::tempdir().unwrap();
        let red = dir.path().join("red/r.png");
        write_png(&red, [255, 0, 0]);

        let model = RedModel { vocabulary: vocab(), width: 3 };
        let pre = Preprocessor::new(vocab(), 2);
        let batch = score_images(&model, &pre, &[LabeledImage::from_path(&red)], FailurePolicy::Skip).unwrap();
        assert_eq!(batch.failure_count(), 1);
    }
}
