pub mod cross_entropy;
pub mod loss;

pub use cross_entropy::CrossEntropyLoss;
pub use loss::{Loss, LossOutput};
