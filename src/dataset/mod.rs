pub mod batch;
pub mod dataset;
pub mod folder;
pub mod loader;
pub mod prepare;
pub mod presets;
pub mod transform;

pub use batch::{Batch, Sample};
pub use dataset::{Dataset, InMemoryDataset};
pub use folder::ImageFolder;
pub use loader::{BatchSource, DataLoader};
pub use prepare::{prepare_validation_split, PrepareReport};
pub use presets::{image_folder_loaders, tiny_imagenet_loaders};
pub use transform::ImageTransform;
