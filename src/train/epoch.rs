use tracing::debug;

use crate::dataset::loader::BatchSource;
use crate::error::Result;
use crate::loss::loss::Loss;
use crate::model::mode::Mode;
use crate::model::model::Model;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_stats::{Accumulator, EpochMetrics};

/// One optimization pass over every training batch.
///
/// Runs the model in `Mode::Train` and applies one optimizer step per batch:
/// forward, loss, `zero_grad`, backward, step. Any error aborts the pass.
pub fn run_training_pass<M, B, L, O>(
    epoch: usize,
    model: &mut M,
    loader: &mut B,
    loss_function: &L,
    optimizer: &mut O,
) -> Result<EpochMetrics>
where
    M: Model + ?Sized,
    B: BatchSource + ?Sized,
    L: Loss + ?Sized,
    O: Optimizer + ?Sized,
{
    let mut acc = Accumulator::default();

    for (i, batch) in loader.epoch().enumerate() {
        let batch = batch?;
        let logits = model.forward(&batch.inputs, Mode::Train)?;
        let loss = loss_function.forward(&logits, &batch.targets)?;

        model.zero_grad();
        model.backward(&loss.grad)?;
        optimizer.step(model.parameters_mut())?;

        acc.update(loss.value, &logits, &batch.targets);
        debug!(epoch, batch = i, size = batch.len(), loss = loss.value, "train batch");
    }

    acc.finish(epoch)
}

/// One forward-only pass over every validation batch.
///
/// Runs the model in `Mode::Eval` and never calls `backward` or the
/// optimizer, so parameters are left untouched. With a loader that replays
/// the same batches the result is deterministic.
pub fn run_validation_pass<M, B, L>(
    epoch: usize,
    model: &mut M,
    loader: &mut B,
    loss_function: &L,
) -> Result<EpochMetrics>
where
    M: Model + ?Sized,
    B: BatchSource + ?Sized,
    L: Loss + ?Sized,
{
    let mut acc = Accumulator::default();

    for (i, batch) in loader.epoch().enumerate() {
        let batch = batch?;
        let logits = model.forward(&batch.inputs, Mode::Eval)?;
        let loss = loss_function.forward(&logits, &batch.targets)?;

        acc.update(loss.value, &logits, &batch.targets);
        debug!(epoch, batch = i, size = batch.len(), loss = loss.value, "validation batch");
    }

    acc.finish(epoch)
}
