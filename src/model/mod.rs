pub mod mode;
pub mod model;
pub mod sequential;
pub mod spec;
pub mod state_dict;

pub use mode::{Device, Mode};
pub use model::Model;
pub use sequential::Sequential;
pub use spec::{LayerSpec, ModelSpec};
pub use state_dict::{StateDict, TensorRecord};
