//! Error types for ferrite-trainer.

use thiserror::Error;

/// Every failure the harness can surface. Nothing inside the training loop
/// catches these; they abort the run and propagate to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Target class {target} out of range for {classes} output classes")]
    Target { target: usize, classes: usize },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Manifest line {line}: {reason}")]
    Manifest { line: usize, reason: String },

    #[error("Loader produced no batches")]
    EmptyLoader,

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Tracking error: {0}")]
    Tracking(String),
}

pub type Result<T> = std::result::Result<T, Error>;
