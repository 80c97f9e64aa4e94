//! アプリケーション設定管理モジュール
//!
//! 計算デバイスやハイパーパラメータなどをJSON形式で保存・読み込みします。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogLevel;
use crate::model::hyper_parameter::HyperParameters;

/// 計算デバイスの種類
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum DeviceType {
    /// WGPU (GPU) バックエンド
    #[default]
    Wgpu,
    /// WGPU の CPU デバイス
    Cpu,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Wgpu => write!(f, "WGPU (GPU)"),
            DeviceType::Cpu => write!(f, "WGPU (CPU)"),
        }
    }
}

/// 1回の学習実行で使うコンテキスト
///
/// パイプラインの各段階に明示的に渡す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// シャッフル用の乱数シード
    pub seed: u64,
}

impl Default for RunContext {
    fn default() -> Self {
        Self { seed: 1 }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 計算デバイスの種類
    pub device_type: DeviceType,
    /// ハイパーパラメータ
    pub hyper_parameters: HyperParameters,
    /// ランダムシード
    pub seed: u64,
    /// モデル入力サイズ（正方形、ピクセル）
    pub image_size: u32,
    /// ログレベル
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_type: DeviceType::default(),
            hyper_parameters: HyperParameters::default(),
            seed: RunContext::default().seed,
            image_size: 96,
            log_level: LogLevel::default(),
        }
    }
}

impl AppConfig {
    /// 設定ファイルのデフォルトパス
    pub fn default_path() -> PathBuf {
        PathBuf::from("classifier_config.json")
    }

    /// 設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルを読み込む、存在しない場合はデフォルト設定を返す
    ///
    /// ファイルがあるのに読めない場合はエラーを返す。呼び出し時点ではまだ
    /// ロガーが初期化されていないため、ここではログを出さない。
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path).with_context(|| format!("設定ファイルの読み込みに失敗しました: {}", path.display()))
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_or_default() -> anyhow::Result<Self> {
        Self::load_or_default_from(Self::default_path())
    }

    /// 設定を保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn run_context(&self) -> RunContext {
        RunContext { seed: self.seed }
    }

    /// 設定情報を表示
    pub fn display(&self) {
        let hp = &self.hyper_parameters;
        println!("=== アプリケーション設定 ===");
        println!("計算デバイス: {}", self.device_type);
        println!("入力サイズ: {}x{}", self.image_size, self.image_size);
        println!("シード: {}", self.seed);
        println!("\n--- ハイパーパラメータ ---");
        println!("モデル: {}", hp.architecture);
        println!("エポック数: {}", hp.epoch);
        println!("バッチサイズ: {}", hp.batch_size);
        println!("学習率: {}", hp.learning_rate);
        println!("評価データ比率: {}", hp.test_fraction);
        println!("表示件数: {}", hp.results_to_show);
        println!("========================\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.device_type, DeviceType::Wgpu);
        assert_eq!(config.seed, 1);
        assert_eq!(config.hyper_parameters.epoch, 200);
        assert_eq!(config.run_context(), RunContext::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.seed = 99;
        config.device_type = DeviceType::Cpu;
        config.hyper_parameters.epoch = 3;
        config.save(&path).unwrap();

        let loaded = AppConfig::load_or_default_from(&path).unwrap();
        assert_eq!(loaded.seed, 99);
        assert_eq!(loaded.device_type, DeviceType::Cpu);
        assert_eq!(loaded.hyper_parameters.epoch, 3);
    }

    #[test]
    fn test_missing_file_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_or_default_from(dir.path().join("none.json")).unwrap();
        assert_eq!(loaded.seed, AppConfig::default().seed);
    }

    #[test]
    fn test_broken_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "seed": "not-a-number""#).unwrap();

        let err = AppConfig::load_or_default_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("config.json"));
    }

    #[test]
    fn test_device_type_display() {
        assert_eq!(format!("{}", DeviceType::Wgpu), "WGPU (GPU)");
        assert_eq!(format!("{}", DeviceType::Cpu), "WGPU (CPU)");
    }
}
