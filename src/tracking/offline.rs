use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use crate::error::{Error, Result};
use crate::tracking::record::{MetricRecord, RunInfo, EPOCH};
use crate::tracking::sink::MetricsSink;

/// Offline tracking: each session becomes a directory
/// `{root}/{project}/{run}/` holding
///
/// - `config.json`   project, run name and flattened hyperparameters
/// - `metrics.jsonl` one JSON object per logged record
/// - `files/`        copies of registered artifacts
/// - `summary.json`  last value of every key, written by `finish`
pub struct OfflineSink {
    root: PathBuf,
    run_dir: Option<PathBuf>,
    metrics: Option<BufWriter<File>>,
    summary: BTreeMap<String, f64>,
}

impl OfflineSink {
    pub fn new(root: impl Into<PathBuf>) -> OfflineSink {
        OfflineSink { root: root.into(), run_dir: None, metrics: None, summary: BTreeMap::new() }
    }

    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    fn active_dir(&self) -> Result<&Path> {
        self.run_dir
            .as_deref()
            .ok_or_else(|| Error::Tracking("tracking session not initialized".to_owned()))
    }
}

/// Project and run names each become exactly one directory level.
fn check_dir_name(value: &str, what: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains('/')
        && !value.contains('\\');
    if valid {
        Ok(())
    } else {
        Err(Error::Tracking(format!("invalid {} name `{}`", what, value)))
    }
}

impl MetricsSink for OfflineSink {
    fn init(&mut self, run: &RunInfo) -> Result<()> {
        check_dir_name(&run.project, "project")?;
        check_dir_name(&run.name, "run")?;
        let dir = self.root.join(&run.project).join(&run.name);
        fs::create_dir_all(dir.join("files"))?;

        let config = json!({ "project": run.project, "name": run.name, "config": run.config });
        fs::write(dir.join("config.json"), serde_json::to_string_pretty(&config)?)?;

        self.metrics = Some(BufWriter::new(File::create(dir.join("metrics.jsonl"))?));
        self.summary.clear();
        info!(dir = %dir.display(), "offline tracking session started");
        self.run_dir = Some(dir);
        Ok(())
    }

    fn log(&mut self, record: &MetricRecord) -> Result<()> {
        let writer = self
            .metrics
            .as_mut()
            .ok_or_else(|| Error::Tracking("tracking session not initialized".to_owned()))?;
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        self.summary.insert(EPOCH.to_owned(), record.epoch as f64);
        for (key, value) in &record.values {
            self.summary.insert(key.clone(), *value);
        }
        Ok(())
    }

    fn save_artifact(&mut self, path: &Path) -> Result<()> {
        let dir = self.active_dir()?.join("files");
        let name = path
            .file_name()
            .ok_or_else(|| Error::Tracking(format!("artifact {} has no file name", path.display())))?;
        fs::copy(path, dir.join(name))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let dir = self.active_dir()?.to_path_buf();
        if let Some(mut writer) = self.metrics.take() {
            writer.flush()?;
        }
        fs::write(dir.join("summary.json"), serde_json::to_string_pretty(&self.summary)?)?;
        info!(dir = %dir.display(), "offline tracking session finished");
        Ok(())
    }
}
