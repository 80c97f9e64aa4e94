//! 学習済みモデルで画像を分類する
//!
//! 使い方: classify_images <画像フォルダ> <画像ファイルまたはフォルダ>
//!
//! 画像フォルダには学習時に出力された model.tar.gz と pipeline.json があること。

use std::path::PathBuf;
use std::process::ExitCode;

use image_classification_lib::classifier::{classify_folder, classify_single_image};
use image_classification_lib::logging::{init_logging, LogConfig};
use image_classification_lib::ml::load_classifier;
use image_classification_lib::model::{print_metadata_info, AppConfig, ResultArtifactSet};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("使い方: classify_images <画像フォルダ> <画像ファイルまたはフォルダ>");
        return ExitCode::FAILURE;
    }
    let model_folder = PathBuf::from(&args[1]);
    let target = PathBuf::from(&args[2]);

    let config = match AppConfig::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("エラー: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&LogConfig::with_level(config.log_level)) {
        eprintln!("{}", e);
    }

    let files = ResultArtifactSet::new(&model_folder);
    let (model, preprocessor) = match load_classifier(&files.pipeline_path, &files.model_path, &config.device_type) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ モデル読み込みエラー: {}", e);
            return ExitCode::FAILURE;
        }
    };
    print_metadata_info(model.metadata());

    if target.is_dir() {
        match classify_folder(&model, &preprocessor, &target) {
            Ok(results) => {
                println!("✓ {} 枚を分類しました", results.len());
                for (i, r) in results.iter().enumerate() {
                    let mark = if r.is_correct { "○" } else { "×" };
                    println!(
                        "[No.{}] {} {} -> {} ({})",
                        i + 1,
                        mark,
                        r.file_name,
                        r.predicted_label,
                        r.ordered_label_scores[0].percent()
                    );
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("✗ エラー: {}", e);
                ExitCode::FAILURE
            }
        }
    } else {
        match classify_single_image(&model, &preprocessor, &target) {
            Ok(result) => {
                println!(
                    "✓ {}: {} ({:.2}%)",
                    result.file_name,
                    result.predicted_label,
                    result.score * 100.0
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("✗ エラー: {}", e);
                ExitCode::FAILURE
            }
        }
    }
}
