pub mod config;
pub mod epoch;
pub mod epoch_stats;
pub mod trainer;

pub use config::TrainingConfig;
pub use epoch::{run_training_pass, run_validation_pass};
pub use epoch_stats::EpochMetrics;
pub use trainer::{Trainer, DEFAULT_PROJECT};
