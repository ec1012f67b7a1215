//! One-time restructuring of a flat validation split into the per-class
//! layout `ImageFolder` expects.
//!
//! Input layout:
//! ```text
//! val/
//!   val_annotations.txt    filename<TAB>class<TAB>...
//!   images/<filename>
//! ```
//! Output layout: `val/<class>/<filename>`, with `images/` removed.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "val_annotations.txt";
pub const STAGING_DIR: &str = "images";

/// One row of the annotation manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub filename: String,
    pub class: String,
}

/// Outcome of `prepare_validation_split`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrepareReport {
    pub images: usize,
    pub classes: usize,
    /// The staging directory was already gone, so nothing was done.
    pub already_prepared: bool,
}

fn check_component(value: &str, what: &str, line: usize) -> Result<()> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains('/')
        && !value.contains('\\');
    if valid {
        Ok(())
    } else {
        Err(Error::Manifest { line, reason: format!("invalid {} `{}`", what, value) })
    }
}

/// Parses a tab-separated manifest. Columns after the second are ignored and
/// blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse_manifest<R: Read>(reader: R) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            continue;
        }
        let mut columns = trimmed.split('\t');
        let filename = columns.next().unwrap_or_default().trim();
        let class = columns
            .next()
            .map(str::trim)
            .ok_or_else(|| Error::Manifest { line: line_no, reason: "missing class column".to_owned() })?;
        check_component(filename, "filename", line_no)?;
        check_component(class, "class", line_no)?;
        entries.push(ManifestEntry { filename: filename.to_owned(), class: class.to_owned() });
    }
    Ok(entries)
}

/// Restructures `val_dir` using its `val_annotations.txt` and `images/`
/// staging directory. A rerun after success finds no staging directory and
/// returns a report with `already_prepared` set.
pub fn prepare_validation_split(val_dir: &Path) -> Result<PrepareReport> {
    restructure_split(val_dir, &val_dir.join(MANIFEST_FILE), &val_dir.join(STAGING_DIR))
}

/// Copies every manifest entry from `staging_dir/<filename>` into
/// `target_dir/<class>/<filename>`, then removes `staging_dir`.
///
/// Any failure aborts before the staging directory is removed, so the step
/// can be retried.
pub fn restructure_split(target_dir: &Path, manifest: &Path, staging_dir: &Path) -> Result<PrepareReport> {
    if !staging_dir.exists() {
        info!(dir = %target_dir.display(), "validation split already prepared");
        return Ok(PrepareReport { already_prepared: true, ..PrepareReport::default() });
    }

    let entries = parse_manifest(fs::File::open(manifest)?)?;
    let mut classes: Vec<&str> = Vec::new();

    for entry in &entries {
        let class_dir: PathBuf = target_dir.join(&entry.class);
        fs::create_dir_all(&class_dir)?;
        if !classes.contains(&entry.class.as_str()) {
            classes.push(&entry.class);
        }
        let source = staging_dir.join(&entry.filename);
        if !source.is_file() {
            return Err(Error::Dataset(format!(
                "manifest lists {} but {} does not exist",
                entry.filename,
                source.display()
            )));
        }
        fs::copy(&source, class_dir.join(&entry.filename))?;
    }

    fs::remove_dir_all(staging_dir)?;
    info!(images = entries.len(), classes = classes.len(), "restructured validation split");

    Ok(PrepareReport { images: entries.len(), classes: classes.len(), already_prepared: false })
}
