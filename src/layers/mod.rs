pub mod activation;
pub mod dense;
pub mod dropout;
pub mod layer;
pub mod param;

pub use activation::Activation;
pub use dense::{Init, Linear};
pub use dropout::Dropout;
pub use layer::Layer;
pub use param::Param;
