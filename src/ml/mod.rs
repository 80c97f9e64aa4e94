pub mod inference;
pub mod ml_model;
pub mod training;

pub use inference::{load_classifier, BurnModel};
pub use ml_model::{channel_widths, ImageClassifier, ModelConfig};
pub use training::{select_device, BurnTrainer, ImageBatch, ImageBatcher, ImageDataset, ImageItem};
