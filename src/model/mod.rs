pub mod artifacts;
pub mod config;
pub mod hyper_parameter;
pub mod model_metadata;
pub mod model_storage;
pub mod preprocess;

pub use artifacts::ResultArtifactSet;
pub use config::{AppConfig, DeviceType, RunContext};
pub use hyper_parameter::{Architecture, HyperParameters};
pub use model_metadata::ModelMetadata;
pub use model_storage::{load_metadata, load_model_binary, load_model_with_metadata, print_metadata_info, save_model_with_metadata};
pub use preprocess::{PreparedImage, Preprocessor};
