use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::model::state_dict::StateDict;

/// Durable storage for the best-so-far parameter snapshot of a session.
pub trait CheckpointStore {
    /// Writes `state` as the current best checkpoint of `training_name`,
    /// replacing any previous one, and returns where it was written.
    fn save(&mut self, training_name: &str, state: &StateDict) -> Result<PathBuf>;
}

impl<C: CheckpointStore + ?Sized> CheckpointStore for Box<C> {
    fn save(&mut self, training_name: &str, state: &StateDict) -> Result<PathBuf> {
        (**self).save(training_name, state)
    }
}

/// Stores checkpoints as `{dir}/{training_name}_best.json`.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> FileCheckpointStore {
        FileCheckpointStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, training_name: &str) -> PathBuf {
        self.dir.join(format!("{}_best.json", training_name))
    }

    pub fn load(&self, training_name: &str) -> Result<StateDict> {
        let path = self.path_for(training_name);
        if !path.is_file() {
            return Err(Error::Checkpoint(format!("no checkpoint at {}", path.display())));
        }
        let json = fs::read_to_string(&path)?;
        StateDict::from_json(&json)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&mut self, training_name: &str, state: &StateDict) -> Result<PathBuf> {
        if training_name.is_empty() || training_name.contains(['/', '\\']) {
            return Err(Error::Checkpoint(format!(
                "training name `{}` cannot be used as a file name",
                training_name
            )));
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(training_name);
        // Write beside the target and rename, so readers never see a torn file.
        let tmp = self.dir.join(format!(".{}_best.json.tmp", training_name));
        fs::write(&tmp, state.to_json()?)?;
        fs::rename(&tmp, &path)?;
        info!(path = %path.display(), tensors = state.len(), "saved checkpoint");
        Ok(path)
    }
}
