use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::train::epoch_stats::EpochMetrics;

pub const EPOCH: &str = "Epoch";
pub const TRAIN_LOSS: &str = "Train Loss";
pub const TRAIN_ACCURACY: &str = "Train Accuracy";
pub const VALIDATION_LOSS: &str = "Validation Loss";
pub const VALIDATION_ACCURACY: &str = "Validation Accuracy";

/// Identity and configuration of a tracking session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub project: String,
    pub name: String,
    /// Flattened hyperparameters: epochs, batch size, learning rate, class
    /// names of model/optimizer/loss and every optimizer parameter.
    pub config: BTreeMap<String, Value>,
}

/// One structured metric record, keyed by display name and stepped by epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    #[serde(rename = "Epoch")]
    pub epoch: usize,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl MetricRecord {
    fn with(epoch: usize, loss_key: &str, loss: f64, accuracy_key: &str, accuracy: f64) -> MetricRecord {
        let mut values = BTreeMap::new();
        values.insert(loss_key.to_owned(), loss);
        values.insert(accuracy_key.to_owned(), accuracy);
        MetricRecord { epoch, values }
    }

    pub fn train(metrics: &EpochMetrics) -> MetricRecord {
        MetricRecord::with(metrics.epoch, TRAIN_LOSS, metrics.loss, TRAIN_ACCURACY, metrics.accuracy)
    }

    pub fn validation(metrics: &EpochMetrics) -> MetricRecord {
        MetricRecord::with(
            metrics.epoch,
            VALIDATION_LOSS,
            metrics.loss,
            VALIDATION_ACCURACY,
            metrics.accuracy,
        )
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        if key == EPOCH {
            Some(self.epoch as f64)
        } else {
            self.values.get(key).copied()
        }
    }
}
