//! 画像分類用CNNモデルの定義
//!
//! 畳み込み層で特徴を抽出し、全体平均プーリングの後に全結合層で分類します。
//! 各層のチャネル数は転移学習モデルの種類ごとに切り替えます。

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};

use crate::model::Architecture;

/// 畳み込み3層のチャネル数
pub fn channel_widths(architecture: Architecture) -> [usize; 3] {
    match architecture {
        Architecture::ResnetV2101 => [48, 96, 192],
        Architecture::InceptionV3 => [40, 80, 160],
        Architecture::MobilenetV2 => [16, 32, 64],
        Architecture::ResnetV250 => [32, 64, 128],
    }
}

/// モデル設定
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// 分類クラス数
    pub num_classes: usize,
    /// 畳み込み層のチャネル数
    pub widths: [usize; 3],
    /// 全結合層の隠れ次元
    #[config(default = 256)]
    pub hidden: usize,
    /// ドロップアウト率
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl ModelConfig {
    pub fn for_architecture(architecture: Architecture, num_classes: usize) -> Self {
        Self::new(num_classes, channel_widths(architecture))
    }

    /// モデルを初期化
    pub fn init<B: Backend>(&self, device: &B::Device) -> ImageClassifier<B> {
        let [c1, c2, c3] = self.widths;

        ImageClassifier {
            // 3x3 (same padding) + 2x2 Pool
            conv1: Conv2dConfig::new([3, c1], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool1: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),

            conv2: Conv2dConfig::new([c1, c2], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            pool2: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),

            conv3: Conv2dConfig::new([c2, c3], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),

            // 入力サイズに依存しないよう全体平均プーリングで 1x1 にする
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),

            fc1: LinearConfig::new(c3, self.hidden).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2: LinearConfig::new(self.hidden, self.num_classes).init(device),

            activation: Relu::new(),
        }
    }
}

/// 画像分類用CNNモデル
///
/// # アーキテクチャ
/// - {Conv 3x3 + ReLU + MaxPool} x 2層
/// - Conv 3x3 + ReLU
/// - Global Average Pooling
/// - FC: c3 -> hidden + ReLU + Dropout
/// - FC: hidden -> num_classes
/// - Softmax (推論時)
#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    conv1: Conv2d<B>,
    pool1: MaxPool2d,
    conv2: Conv2d<B>,
    pool2: MaxPool2d,
    conv3: Conv2d<B>,

    global_pool: AdaptiveAvgPool2d,

    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,

    activation: Relu,
}

impl<B: Backend> ImageClassifier<B> {
    /// 順伝播
    ///
    /// # 引数
    /// - `images`: バッチ画像 [batch_size, 3, size, size]
    ///
    /// # 戻り値
    /// - クラスごとのロジット [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images);
        let x = self.activation.forward(x);
        let x = self.pool1.forward(x);

        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);
        let x = self.pool2.forward(x);

        let x = self.conv3.forward(x);
        let x = self.activation.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        self.fc2.forward(x)
    }

    /// クラスごとの確率 [batch_size, num_classes]
    pub fn forward_softmax(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        burn::tensor::activation::softmax(self.forward(images), 1)
    }

    /// 順伝播と損失計算（学習用）
    pub fn forward_classification(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput::new(loss, output, targets)
    }
}
