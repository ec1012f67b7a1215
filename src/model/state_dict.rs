use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Serialized form of one parameter tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl From<&Matrix> for TensorRecord {
    fn from(m: &Matrix) -> Self {
        TensorRecord { shape: vec![m.rows, m.cols], data: m.data.clone() }
    }
}

impl TensorRecord {
    pub fn to_matrix(&self) -> Result<Matrix> {
        match self.shape.as_slice() {
            [rows, cols] => Matrix::from_vec(*rows, *cols, self.data.clone()),
            other => Err(Error::Checkpoint(format!(
                "expected a 2-d parameter tensor, got shape {:?}",
                other
            ))),
        }
    }
}

/// Parameter snapshot of a model: parameter name to tensor, in name order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateDict(BTreeMap<String, TensorRecord>);

impl StateDict {
    pub fn new() -> StateDict {
        StateDict(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: TensorRecord) {
        self.0.insert(name.into(), tensor);
    }

    pub fn get(&self, name: &str) -> Option<&TensorRecord> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<StateDict> {
        Ok(serde_json::from_str(json)?)
    }
}
