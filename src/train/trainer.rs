use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::info;

use crate::checkpoint::store::CheckpointStore;
use crate::dataset::loader::BatchSource;
use crate::error::Result;
use crate::loss::loss::Loss;
use crate::model::mode::Device;
use crate::model::model::Model;
use crate::optim::optimizer::Optimizer;
use crate::tracking::record::{MetricRecord, RunInfo};
use crate::tracking::sink::MetricsSink;
use crate::train::config::TrainingConfig;
use crate::train::epoch::{run_training_pass, run_validation_pass};

pub const DEFAULT_PROJECT: &str = "ferrite";

/// Drives the epoch loop of a training session.
///
/// Checkpoint writes and tracking calls go through the `CheckpointStore` and
/// `MetricsSink` collaborators, so the control flow can run against
/// in-memory doubles.
pub struct Trainer<C, S> {
    project: String,
    device: Device,
    checkpoints: C,
    sink: S,
}

impl<C: CheckpointStore, S: MetricsSink> Trainer<C, S> {
    pub fn new(checkpoints: C, sink: S) -> Trainer<C, S> {
        Trainer { project: DEFAULT_PROJECT.to_owned(), device: Device::Cpu, checkpoints, sink }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Trainer<C, S> {
        self.project = project.into();
        self
    }

    pub fn with_device(mut self, device: Device) -> Trainer<C, S> {
        self.device = device;
        self
    }

    pub fn checkpoints(&self) -> &C {
        &self.checkpoints
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (C, S) {
        (self.checkpoints, self.sink)
    }

    /// Trains for `config.epochs()` epochs and returns the best validation
    /// accuracy seen.
    ///
    /// Each epoch runs a training pass, then a validation pass when
    /// `val_loader` is given. A validation accuracy strictly above the best
    /// so far replaces the session checkpoint and registers it with the sink.
    /// Without a validation loader nothing is checkpointed and the result is
    /// 0.0. Errors abort the run immediately and leave the tracking session
    /// unfinished.
    pub fn run<M, L, O>(
        &mut self,
        config: &mut TrainingConfig<M, L, O>,
        train_loader: &mut dyn BatchSource,
        mut val_loader: Option<&mut dyn BatchSource>,
    ) -> Result<f64>
    where
        M: Model,
        L: Loss,
        O: Optimizer,
    {
        let run = RunInfo {
            project: self.project.clone(),
            name: config.training_name().to_owned(),
            config: run_config(config, train_loader.batch_size()),
        };
        self.sink.init(&run)?;

        let training_name = config.training_name().to_owned();
        let epochs = config.epochs();
        let (model, loss_function, optimizer) = config.session_mut();
        model.to_device(self.device)?;
        info!(run = %training_name, epochs, device = %self.device, "starting training");

        let mut best_accuracy = 0.0;

        for epoch in 1..=epochs {
            let train = run_training_pass(epoch, model, train_loader, loss_function, optimizer)?;
            self.sink.log(&MetricRecord::train(&train))?;
            info!(
                "Epoch: {}: Train Loss: {:.6}, Train Accuracy: {:.2}",
                epoch, train.loss, train.accuracy
            );

            if let Some(val_loader) = val_loader.as_mut() {
                let val = run_validation_pass(epoch, model, &mut **val_loader, loss_function)?;
                self.sink.log(&MetricRecord::validation(&val))?;
                info!(
                    "Epoch: {}: Validation Loss: {:.6}, Validation Accuracy: {:.2}",
                    epoch, val.loss, val.accuracy
                );

                if val.accuracy > best_accuracy {
                    best_accuracy = val.accuracy;
                    let path = self.checkpoints.save(&training_name, &model.state_dict())?;
                    self.sink.save_artifact(&path)?;
                    info!(epoch, accuracy = best_accuracy, path = %path.display(), "new best model");
                }
            }
        }

        self.sink.finish()?;
        info!(run = %training_name, best_accuracy, "training finished");
        Ok(best_accuracy)
    }
}

/// Hyperparameter snapshot logged when the session starts. Optimizer
/// parameters are flattened into the same map.
fn run_config<M: Model, L: Loss, O: Optimizer>(
    config: &TrainingConfig<M, L, O>,
    batch_size: usize,
) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    map.insert("epochs".to_owned(), json!(config.epochs()));
    map.insert("batch_size".to_owned(), json!(batch_size));
    map.insert("learning_rate".to_owned(), json!(config.learning_rate()));
    map.insert("architecture".to_owned(), json!(config.model().name()));
    map.insert("optimizer_class".to_owned(), json!(config.optimizer().name()));
    map.insert("loss_function".to_owned(), json!(config.loss_function().name()));
    for (key, value) in config.optimizer_params() {
        map.insert(key.clone(), value.clone());
    }
    map
}
