//! 画像分類モデルの学習
//!
//! 使い方: image_classification <画像フォルダ>
//!
//! 画像フォルダ直下のサブフォルダ名をラベルとして学習し、
//! model.tar.gz / pipeline.json / resultYYYYMMDDhhmmss.html を画像フォルダに出力します。
//! 引数が1つでない場合や、フォルダが存在しない場合は何もしません。

use std::path::PathBuf;
use std::process::ExitCode;

use image_classification_lib::logging::{init_logging, LogConfig};
use image_classification_lib::model::AppConfig;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        return ExitCode::SUCCESS;
    }
    let images_folder = PathBuf::from(&args[1]);
    if !images_folder.is_dir() {
        return ExitCode::SUCCESS;
    }

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
    config.display();

    run(&images_folder, &config)
}

#[cfg(feature = "ml")]
fn run(images_folder: &std::path::Path, config: &AppConfig) -> ExitCode {
    use image_classification_lib::generate_model;
    use image_classification_lib::ml::BurnTrainer;

    let trainer = BurnTrainer::new(config.device_type.clone());
    match generate_model(
        images_folder,
        &config.hyper_parameters,
        config.run_context(),
        config.image_size,
        &trainer,
    ) {
        Ok(results) => {
            let metrics = &results.evaluation.metrics;
            let confidence = &results.evaluation.confidence;
            println!("=== 学習結果 ===");
            println!("学習 / 検証 / 評価: {} / {} / {}", results.train_size, results.validation_size, results.test_size);
            println!("MicroAccuracy: {:.3}", metrics.micro_accuracy);
            println!("MacroAccuracy: {:.3}", metrics.macro_accuracy);
            println!("LogLoss: {:.3}", metrics.log_loss);
            match confidence.high_confidence_accuracy {
                Some(a) => println!("高確信度の正解率: {:.3} ({}件)", a, confidence.high_confidence_count),
                None => println!("高確信度の正解率: N/A"),
            }
            println!("モデル: {}", results.files.model_path.display());
            println!("パイプライン: {}", results.files.pipeline_path.display());
            println!("レポート: {}", results.files.report_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "ml"))]
fn run(_images_folder: &std::path::Path, _config: &AppConfig) -> ExitCode {
    eprintln!("エラー: 学習には `ml` フィーチャーが必要です");
    ExitCode::FAILURE
}
