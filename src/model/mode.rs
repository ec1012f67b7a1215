use std::fmt;

/// Operating mode of a forward pass.
///
/// `Train` enables training-time behavior (dropout masks) and records the
/// activations the backward pass needs. `Eval` disables both, so a forward
/// pass in this mode never touches parameters or gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// Compute device a model lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}
