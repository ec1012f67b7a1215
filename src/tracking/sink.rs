use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::tracking::record::{MetricRecord, RunInfo};

/// Experiment-tracking client: one session per training run.
///
/// `init` is called once before the first epoch and `finish` once after the
/// last; a run that fails in between never reaches `finish`.
pub trait MetricsSink {
    fn init(&mut self, run: &RunInfo) -> Result<()>;

    fn log(&mut self, record: &MetricRecord) -> Result<()>;

    /// Registers a written file (e.g. a checkpoint) with the session.
    fn save_artifact(&mut self, path: &Path) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn init(&mut self, run: &RunInfo) -> Result<()> {
        (**self).init(run)
    }

    fn log(&mut self, record: &MetricRecord) -> Result<()> {
        (**self).log(record)
    }

    fn save_artifact(&mut self, path: &Path) -> Result<()> {
        (**self).save_artifact(path)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Tracking disabled: records only reach the log.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn init(&mut self, run: &RunInfo) -> Result<()> {
        info!(project = %run.project, run = %run.name, "tracking disabled, metrics go to the log only");
        Ok(())
    }

    fn log(&mut self, record: &MetricRecord) -> Result<()> {
        debug!(?record, "metric record");
        Ok(())
    }

    fn save_artifact(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "artifact not uploaded, tracking disabled");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every call in memory; useful when embedding the trainer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub run: Option<RunInfo>,
    pub records: Vec<MetricRecord>,
    pub artifacts: Vec<PathBuf>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// Values of `key` across records, in logging order. `Epoch` is present
    /// in every record.
    pub fn series(&self, key: &str) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.get(key)).collect()
    }
}

impl MetricsSink for MemorySink {
    fn init(&mut self, run: &RunInfo) -> Result<()> {
        self.run = Some(run.clone());
        Ok(())
    }

    fn log(&mut self, record: &MetricRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn save_artifact(&mut self, path: &Path) -> Result<()> {
        self.artifacts.push(path.to_path_buf());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
