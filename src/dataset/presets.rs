use std::path::Path;

use tracing::info;

use crate::dataset::dataset::Dataset;
use crate::dataset::folder::ImageFolder;
use crate::dataset::loader::DataLoader;
use crate::dataset::transform::ImageTransform;
use crate::error::Result;

pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Train/validation loaders over a Tiny-ImageNet style tree
/// (`root/train/<class>/...`, `root/val/<class>/...`).
///
/// The training loader is reshuffled every epoch; the validation loader keeps
/// natural order and reuses the training class indices.
pub fn image_folder_loaders(
    train_root: &Path,
    val_root: &Path,
    transform: ImageTransform,
    batch_size: usize,
    seed: u64,
) -> Result<(DataLoader<ImageFolder>, DataLoader<ImageFolder>)> {
    let train = ImageFolder::new(train_root, transform.clone())?;
    let val = ImageFolder::with_classes(val_root, transform, train.classes())?;
    info!(
        classes = train.classes().len(),
        train_images = train.len(),
        val_images = val.len(),
        "loaded image folders"
    );
    Ok((
        DataLoader::with_seed(train, batch_size, true, seed)?,
        DataLoader::new(val, batch_size, false)?,
    ))
}

/// `image_folder_loaders` with the standard 224x224 ImageNet preprocessing.
pub fn tiny_imagenet_loaders(
    root: &Path,
    batch_size: usize,
    seed: u64,
) -> Result<(DataLoader<ImageFolder>, DataLoader<ImageFolder>)> {
    image_folder_loaders(
        &root.join("train"),
        &root.join("val"),
        ImageTransform::imagenet(DEFAULT_IMAGE_SIZE)?,
        batch_size,
        seed,
    )
}
