use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::dataset::batch::Sample;
use crate::dataset::dataset::Dataset;
use crate::dataset::transform::ImageTransform;
use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Labeled images laid out as `root/<class>/<image>`.
///
/// Classes are the sorted subdirectory names and map to indices `0..n` in
/// that order. Images are decoded lazily, one `get` at a time.
#[derive(Debug, Clone)]
pub struct ImageFolder {
    root: PathBuf,
    classes: Vec<String>,
    samples: Vec<(PathBuf, usize)>,
    transform: ImageTransform,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

impl ImageFolder {
    pub fn new(root: impl Into<PathBuf>, transform: ImageTransform) -> Result<ImageFolder> {
        let root = root.into();
        let classes: Vec<String> = sorted_entries(&root)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
            .collect();
        ImageFolder::with_classes(root, transform, &classes)
    }

    /// Indexes `root` against a fixed class list, so a validation split uses
    /// the same class indices as its training split. A class directory that
    /// is not in `classes` is an error; a listed class may be absent.
    pub fn with_classes(
        root: impl Into<PathBuf>,
        transform: ImageTransform,
        classes: &[String],
    ) -> Result<ImageFolder> {
        let root = root.into();
        if classes.is_empty() {
            return Err(Error::Dataset(format!("no class directories under {}", root.display())));
        }
        let index: HashMap<&str, usize> =
            classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();

        let mut samples = Vec::new();
        for dir in sorted_entries(&root)?.into_iter().filter(|p| p.is_dir()) {
            let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_owned();
            let label = *index.get(name.as_str()).ok_or_else(|| {
                Error::Dataset(format!("unknown class directory `{}` in {}", name, root.display()))
            })?;
            for file in sorted_entries(&dir)? {
                if file.is_file() && is_image(&file) {
                    samples.push((file, label));
                } else {
                    warn!("skipping non-image entry {}", file.display());
                }
            }
        }
        if samples.is_empty() {
            return Err(Error::Dataset(format!("no images found under {}", root.display())));
        }
        debug!(root = %root.display(), classes = classes.len(), images = samples.len(), "indexed image folder");

        Ok(ImageFolder { root, classes: classes.to_vec(), samples, transform })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.samples.get(index).map(|(p, _)| p.as_path())
    }
}

impl Dataset for ImageFolder {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn get(&self, index: usize) -> Result<Sample> {
        let (path, label) = self.samples.get(index).ok_or_else(|| {
            Error::Dataset(format!("index {} out of range for {} images", index, self.samples.len()))
        })?;
        Ok(Sample { image: self.transform.load(path)?, label: *label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(path: &Path, value: u8) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(3, 3, Rgb([value, value, value])).save(path).unwrap();
    }

    #[test]
    fn indexes_sorted_classes_and_files() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("zebra/b.png"), 10);
        write_image(&dir.path().join("zebra/a.png"), 20);
        write_image(&dir.path().join("ant/c.png"), 30);
        fs::write(dir.path().join("ant/notes.txt"), "ignored").unwrap();

        let folder = ImageFolder::new(dir.path(), ImageTransform::imagenet(2).unwrap()).unwrap();
        assert_eq!(folder.classes(), &["ant".to_owned(), "zebra".to_owned()]);
        assert_eq!(folder.len(), 3);
        assert_eq!(folder.get(0).unwrap().label, 0);
        assert!(folder.path(1).unwrap().ends_with("zebra/a.png"));
        assert_eq!(folder.get(2).unwrap().label, 1);
        assert_eq!(folder.get(2).unwrap().image.shape(), &[3, 2, 2]);
    }

    #[test]
    fn validation_split_reuses_training_class_indices() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("b/x.png"), 10);
        let classes = vec!["a".to_owned(), "b".to_owned()];
        let folder =
            ImageFolder::with_classes(dir.path(), ImageTransform::imagenet(2).unwrap(), &classes).unwrap();
        assert_eq!(folder.get(0).unwrap().label, 1);
    }

    #[test]
    fn unknown_class_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_image(&dir.path().join("c/x.png"), 10);
        let classes = vec!["a".to_owned()];
        let err = ImageFolder::with_classes(dir.path(), ImageTransform::imagenet(2).unwrap(), &classes)
            .unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn empty_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFolder::new(dir.path(), ImageTransform::imagenet(2).unwrap()).is_err());
    }
}
