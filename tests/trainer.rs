use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use ferrite_trainer::checkpoint::CheckpointStore;
use ferrite_trainer::dataset::{Batch, BatchSource, DataLoader, ImageFolder, ImageTransform, InMemoryDataset, Sample};
use ferrite_trainer::layers::Param;
use ferrite_trainer::model::TensorRecord;
use ferrite_trainer::tracking::record::{TRAIN_LOSS, VALIDATION_ACCURACY};
use ferrite_trainer::{
    run_validation_pass, ActivationFunction, CrossEntropyLoss, Error, FileCheckpointStore, Matrix, MemorySink,
    Mode, Model, ModelSpec, OfflineSink, Result, Sgd, StateDict, Tensor, Trainer, TrainingConfig,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Predicts class 0 for every training row. In eval mode the number of
/// correctly classified rows (targets are all 0) follows `script`, one entry
/// per epoch. `backward` sets the single parameter's gradient to 1, so with
/// SGD(lr = 1) the parameter equals minus the number of optimizer steps.
struct ScriptedModel {
    script: Vec<usize>,
    evals: usize,
    w: Param,
}

impl ScriptedModel {
    fn new(script: Vec<usize>) -> ScriptedModel {
        ScriptedModel { script, evals: 0, w: Param::new(Matrix::zeros(1, 1)) }
    }
}

impl Model for ScriptedModel {
    fn name(&self) -> &str {
        "ScriptedModel"
    }

    fn forward(&mut self, inputs: &Tensor, mode: Mode) -> Result<Matrix> {
        let rows = inputs.shape()[0];
        let correct = match mode {
            Mode::Train => rows,
            Mode::Eval => {
                let c = self.script[self.evals];
                self.evals += 1;
                c
            }
        };
        let data = (0..rows)
            .flat_map(|i| if i < correct { [1.0, 0.0] } else { [0.0, 1.0] })
            .collect();
        Matrix::from_vec(rows, 2, data)
    }

    fn backward(&mut self, _grad_logits: &Matrix) -> Result<()> {
        self.w.grad.data[0] = 1.0;
        Ok(())
    }

    fn zero_grad(&mut self) {
        self.w.zero_grad();
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Param)> {
        vec![("w".to_owned(), &mut self.w)]
    }

    fn state_dict(&self) -> StateDict {
        let mut s = StateDict::new();
        s.insert("w", TensorRecord::from(&self.w.value));
        s
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        self.w.value = state.get("w").ok_or_else(|| Error::Checkpoint("missing w".to_owned()))?.to_matrix()?;
        Ok(())
    }
}

/// Returns `logits = inputs` so tests control predictions exactly.
struct LogitsAsInputs;

impl Model for LogitsAsInputs {
    fn name(&self) -> &str {
        "LogitsAsInputs"
    }

    fn forward(&mut self, inputs: &Tensor, _mode: Mode) -> Result<Matrix> {
        Ok(inputs.to_matrix())
    }

    fn backward(&mut self, _grad_logits: &Matrix) -> Result<()> {
        Ok(())
    }

    fn zero_grad(&mut self) {}

    fn parameters_mut(&mut self) -> Vec<(String, &mut Param)> {
        Vec::new()
    }

    fn state_dict(&self) -> StateDict {
        StateDict::new()
    }

    fn load_state_dict(&mut self, _state: &StateDict) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingStore {
    saves: Vec<(String, StateDict)>,
}

impl CheckpointStore for RecordingStore {
    fn save(&mut self, training_name: &str, state: &StateDict) -> Result<PathBuf> {
        self.saves.push((training_name.to_owned(), state.clone()));
        Ok(PathBuf::from(format!("{}_best.json", training_name)))
    }
}

/// Counts passes and can fail from a given pass on.
struct CountingLoader {
    inner: DataLoader<InMemoryDataset>,
    passes: Rc<Cell<usize>>,
    fail_from_pass: Option<usize>,
}

impl CountingLoader {
    fn new(inner: DataLoader<InMemoryDataset>) -> (CountingLoader, Rc<Cell<usize>>) {
        let passes = Rc::new(Cell::new(0));
        (CountingLoader { inner, passes: passes.clone(), fail_from_pass: None }, passes)
    }
}

impl BatchSource for CountingLoader {
    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }

    fn num_batches(&self) -> usize {
        self.inner.num_batches()
    }

    fn epoch(&mut self) -> Box<dyn Iterator<Item = Result<Batch>> + '_> {
        self.passes.set(self.passes.get() + 1);
        if matches!(self.fail_from_pass, Some(n) if self.passes.get() >= n) {
            return Box::new(std::iter::once(Err(Error::Dataset("disk went away".to_owned()))));
        }
        self.inner.epoch()
    }
}

fn zeros_dataset(n: usize) -> InMemoryDataset {
    InMemoryDataset::new(
        (0..n)
            .map(|_| Sample { image: Tensor::zeros(vec![1, 1, 1]).unwrap(), label: 0 })
            .collect(),
    )
}

/// Two training batches per epoch, one validation batch of 10 examples.
fn loaders() -> (CountingLoader, Rc<Cell<usize>>, CountingLoader, Rc<Cell<usize>>) {
    let (train, train_passes) = CountingLoader::new(DataLoader::new(zeros_dataset(6), 3, true).unwrap());
    let (val, val_passes) = CountingLoader::new(DataLoader::new(zeros_dataset(10), 10, false).unwrap());
    (train, train_passes, val, val_passes)
}

fn scripted_config(script: Vec<usize>) -> TrainingConfig<ScriptedModel, CrossEntropyLoss, Sgd> {
    let epochs = script.len();
    TrainingConfig::new("scripted", epochs, 1.0, ScriptedModel::new(script), CrossEntropyLoss::new(), Sgd::new(1.0))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Orchestrator control flow
// ---------------------------------------------------------------------------

#[test]
fn runs_one_training_and_one_validation_pass_per_epoch() {
    let mut config = scripted_config(vec![1, 2, 3, 4]);
    let (mut train, train_passes, mut val, val_passes) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();

    assert_eq!(train_passes.get(), 4);
    assert_eq!(val_passes.get(), 4);
    let sink = trainer.sink();
    assert_eq!(sink.records.len(), 8);
    let epochs: Vec<usize> = sink.records.iter().map(|r| r.epoch).collect();
    assert_eq!(epochs, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    assert!(sink.finished);
    // two optimizer steps per epoch
    assert_eq!(config.model().w.value.data[0], -8.0);
}

#[test]
fn checkpoints_only_on_strict_improvement() {
    let mut config = scripted_config(vec![3, 5, 5, 4, 8, 8]);
    let (mut train, _, mut val, _) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    let best = trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();

    assert_eq!(best, 80.0);
    let (store, sink) = trainer.into_parts();
    assert_eq!(sink.series(VALIDATION_ACCURACY), vec![30.0, 50.0, 50.0, 40.0, 80.0, 80.0]);

    // epochs 1, 2 and 5; the snapshot is taken right after that epoch's training
    let saved: Vec<f64> = store.saves.iter().map(|(_, s)| s.get("w").unwrap().data[0]).collect();
    assert_eq!(saved, vec![-2.0, -4.0, -10.0]);
    assert!(store.saves.iter().all(|(name, _)| name == "scripted"));
    assert_eq!(sink.artifacts, vec![PathBuf::from("scripted_best.json"); 3]);
}

#[test]
fn best_accuracy_tracks_running_maximum() {
    let script = vec![2, 7, 1, 9, 6];
    let mut config = scripted_config(script.clone());
    let (mut train, _, mut val, _) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    let best = trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();
    let max = *script.iter().max().unwrap() as f64 * 10.0;
    assert_eq!(best, max);
    assert_eq!(trainer.checkpoints().saves.len(), 3);
}

#[test]
fn zero_accuracy_never_checkpoints() {
    let mut config = scripted_config(vec![0, 0]);
    let (mut train, _, mut val, _) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    assert_eq!(trainer.run(&mut config, &mut train, Some(&mut val)).unwrap(), 0.0);
    assert!(trainer.checkpoints().saves.is_empty());
}

#[test]
fn without_validation_returns_zero_and_never_checkpoints() {
    let mut config = scripted_config(vec![9, 9, 9]);
    let (mut train, train_passes, _, _) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    let best = trainer.run(&mut config, &mut train, None).unwrap();

    assert_eq!(best, 0.0);
    assert_eq!(train_passes.get(), 3);
    assert!(trainer.checkpoints().saves.is_empty());
    let sink = trainer.sink();
    assert_eq!(sink.records.len(), 3);
    assert_eq!(sink.series(TRAIN_LOSS).len(), 3);
    assert!(sink.artifacts.is_empty());
    assert!(sink.finished);
}

#[test]
fn logs_flattened_run_configuration() {
    let mut config = TrainingConfig::new(
        "cfg",
        1,
        0.5,
        ScriptedModel::new(vec![1]),
        CrossEntropyLoss::new(),
        Sgd::new(0.5).with_momentum(0.9),
    )
    .unwrap();
    let (mut train, _, mut val, _) = loaders();
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new()).with_project("mldl");

    trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();

    let run = trainer.sink().run.clone().unwrap();
    assert_eq!(run.project, "mldl");
    assert_eq!(run.name, "cfg");
    let c = &run.config;
    assert_eq!(c["epochs"], serde_json::json!(1));
    assert_eq!(c["batch_size"], serde_json::json!(3));
    assert_eq!(c["learning_rate"], serde_json::json!(0.5));
    assert_eq!(c["architecture"], serde_json::json!("ScriptedModel"));
    assert_eq!(c["optimizer_class"], serde_json::json!("SGD"));
    assert_eq!(c["loss_function"], serde_json::json!("CrossEntropyLoss"));
    assert_eq!(c["momentum"], serde_json::json!(0.9));
    assert_eq!(c["weight_decay"], serde_json::json!(0.0));
}

#[test]
fn failure_aborts_run_and_leaves_session_open() {
    let mut config = scripted_config(vec![4, 6, 8]);
    let (mut train, train_passes, mut val, _) = loaders();
    train.fail_from_pass = Some(2);
    let mut trainer = Trainer::new(RecordingStore::default(), MemorySink::new());

    let err = trainer.run(&mut config, &mut train, Some(&mut val)).unwrap_err();

    assert!(matches!(err, Error::Dataset(_)));
    assert_eq!(train_passes.get(), 2);
    // epoch 1 was committed before the failure
    assert_eq!(trainer.checkpoints().saves.len(), 1);
    assert_eq!(trainer.sink().records.len(), 2);
    assert!(!trainer.sink().finished);
}

// ---------------------------------------------------------------------------
// Epoch runner arithmetic
// ---------------------------------------------------------------------------

/// Rows of 2-class logits `[2, 0]` (predicts 0) or `[0, 2]` (predicts 1).
fn logit_sample(predicts: usize, label: usize) -> Sample {
    let data = if predicts == 0 { vec![2.0, 0.0] } else { vec![0.0, 2.0] };
    Sample { image: Tensor::new(vec![2], data).unwrap(), label }
}

#[test]
fn validation_pass_uses_per_batch_loss_and_per_example_accuracy() {
    // batch 1 (4 rows): 1 correct, 3 wrong; batch 2 (2 rows): both correct
    let samples = vec![
        logit_sample(0, 0),
        logit_sample(0, 1),
        logit_sample(1, 0),
        logit_sample(1, 0),
        logit_sample(1, 1),
        logit_sample(0, 0),
    ];
    let mut loader = DataLoader::new(InMemoryDataset::new(samples), 4, false).unwrap();
    let mut model = LogitsAsInputs;
    let loss = CrossEntropyLoss::new();

    let metrics = run_validation_pass(1, &mut model, &mut loader, &loss).unwrap();

    let right = (1.0 + (-2.0f64).exp()).ln();
    let wrong = (1.0 + 2.0f64.exp()).ln();
    let expected_loss = ((right + 3.0 * wrong) / 4.0 + right) / 2.0;
    assert_eq!(metrics.batches, 2);
    assert_eq!(metrics.examples, 6);
    assert_eq!(metrics.accuracy, 50.0);
    assert!((metrics.loss - expected_loss).abs() < 1e-12);

    let again = run_validation_pass(1, &mut model, &mut loader, &loss).unwrap();
    assert_eq!(again, metrics);
}

// ---------------------------------------------------------------------------
// End to end with real collaborators
// ---------------------------------------------------------------------------

fn blobs(n: usize, offset: usize) -> InMemoryDataset {
    InMemoryDataset::new(
        (0..n)
            .map(|k| {
                let i = k + offset;
                let label = i % 3;
                let t = (i as f64 * 0.61).cos() * 0.25;
                let centre = [[-1.0, 0.0], [1.0, 0.0], [0.0, 1.5]][label];
                Sample {
                    image: Tensor::new(vec![1, 1, 2], vec![centre[0] + t, centre[1] - t]).unwrap(),
                    label,
                }
            })
            .collect(),
    )
}

#[test]
fn best_checkpoint_restores_best_validation_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let spec = ModelSpec::mlp("blob-mlp", 2, &[16], 3, ActivationFunction::ReLU, 0.1).with_seed(3);
    let mut config = TrainingConfig::new("blobs", 8, 0.05, spec.build().unwrap(), CrossEntropyLoss::new(), Sgd::new(0.05))
        .unwrap();
    let mut train = DataLoader::with_seed(blobs(60, 0), 10, true, 4).unwrap();
    let mut val = DataLoader::new(blobs(30, 60), 7, false).unwrap();

    let store = FileCheckpointStore::new(dir.path().join("checkpoints"));
    let mut trainer = Trainer::new(store, OfflineSink::new(dir.path().join("runs")));
    let best = trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();
    assert!(best > 0.0);

    let (store, sink) = trainer.into_parts();
    let mut restored = spec.with_seed(99).build().unwrap();
    restored.load_state_dict(&store.load("blobs").unwrap()).unwrap();
    let metrics = run_validation_pass(1, &mut restored, &mut val, &CrossEntropyLoss::new()).unwrap();
    assert_eq!(metrics.accuracy, best);

    let run_dir = sink.run_dir().unwrap().to_path_buf();
    assert!(run_dir.ends_with("ferrite/blobs"));
    assert!(run_dir.join("files/blobs_best.json").is_file());
    let lines = fs::read_to_string(run_dir.join("metrics.jsonl")).unwrap();
    assert_eq!(lines.lines().count(), 16);
    assert!(run_dir.join("summary.json").is_file());
}

#[test]
fn trains_on_an_image_folder() {
    use image::{Rgb, RgbImage};

    let dir = tempfile::tempdir().unwrap();
    for (split, count) in [("train", 4), ("val", 1)] {
        for (class, value) in [("dark", 10u8), ("light", 240u8)] {
            let class_dir = dir.path().join(split).join(class);
            fs::create_dir_all(&class_dir).unwrap();
            for i in 0..count {
                RgbImage::from_pixel(6, 6, Rgb([value, value, value]))
                    .save(class_dir.join(format!("{}.png", i)))
                    .unwrap();
            }
        }
    }

    let transform = ImageTransform::imagenet(4).unwrap();
    let train_set = ImageFolder::new(dir.path().join("train"), transform.clone()).unwrap();
    let val_set = ImageFolder::with_classes(dir.path().join("val"), transform.clone(), train_set.classes()).unwrap();
    let mut train = DataLoader::with_seed(train_set, 3, true, 0).unwrap();
    let mut val = DataLoader::new(val_set, 2, false).unwrap();

    let model = ModelSpec::mlp("pixels", transform.output_size(), &[8], 2, ActivationFunction::ReLU, 0.0)
        .build()
        .unwrap();
    let mut config = TrainingConfig::new("folder", 5, 0.05, model, CrossEntropyLoss::new(), Sgd::new(0.05)).unwrap();

    let checkpoints = dir.path().join("ckpt");
    let mut trainer = Trainer::new(FileCheckpointStore::new(checkpoints.clone()), MemorySink::new());
    let best = trainer.run(&mut config, &mut train, Some(&mut val)).unwrap();

    assert!(best > 0.0);
    assert!(checkpoints.join("folder_best.json").is_file());
    assert_eq!(trainer.sink().records.len(), 10);
}
