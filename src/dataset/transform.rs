//! Image preprocessing: decode, resize, convert to a CHW tensor in [0, 1],
//! then normalize each channel as `(x - mean) / std`.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// ImageNet channel statistics.
pub const IMAGENET_MEAN: [f64; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f64; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, PartialEq)]
pub struct ImageTransform {
    pub width: u32,
    pub height: u32,
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

impl ImageTransform {
    pub fn new(width: u32, height: u32, mean: [f64; 3], std: [f64; 3]) -> Result<ImageTransform> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!("image size {}x{} must be positive", width, height)));
        }
        if std.iter().any(|&s| s <= 0.0) {
            return Err(Error::InvalidConfig(format!("channel std {:?} must be positive", std)));
        }
        Ok(ImageTransform { width, height, mean, std })
    }

    /// Square resize with ImageNet normalization.
    pub fn imagenet(size: u32) -> Result<ImageTransform> {
        ImageTransform::new(size, size, IMAGENET_MEAN, IMAGENET_STD)
    }

    /// Number of features of one transformed image.
    pub fn output_size(&self) -> usize {
        3 * self.width as usize * self.height as usize
    }

    pub fn apply(&self, img: &DynamicImage) -> Result<Tensor> {
        let resized = img.resize_exact(self.width, self.height, FilterType::Triangle);
        let rgb = resized.to_rgb8();
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = vec![0.0; 3 * w * h];
        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = y as usize * w + x as usize;
            for c in 0..3 {
                let v = pixel.0[c] as f64 / 255.0;
                data[c * w * h + offset] = (v - self.mean[c]) / self.std[c];
            }
        }
        Tensor::new(vec![3, h, w], data)
    }

    pub fn load(&self, path: &Path) -> Result<Tensor> {
        let img = image::open(path)?;
        self.apply(&img)
    }
}
