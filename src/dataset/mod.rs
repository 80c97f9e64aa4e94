pub mod catalog;
pub mod split;
pub mod vocabulary;

pub use catalog::{discover_images, is_image_file, summarize_by_label, LabeledImage};
pub use split::{shuffle_records, split_dataset, train_test_split, DatasetPartitions, FINAL_TEST_FRACTION};
pub use vocabulary::LabelVocabulary;
