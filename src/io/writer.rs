//! Atomic table writers
//!
//! Every file is first written to a temporary file in its destination
//! directory and then renamed over the final path, so a reader never sees a
//! half-written table. [`StagedOutputs`] extends this to a group of files that
//! are published only once all of them were written. If publishing fails
//! part-way, the files already renamed into place are removed again.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::TableRow;
use crate::error::PipelineError;

/// Render rows as CSV, header first even when there are no rows
pub fn csv_bytes<T: TableRow>(rows: &[T]) -> Result<Vec<u8>, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(T::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))
}

/// Write text to `path` atomically, creating parent directories
pub fn write_text_atomic(path: impl AsRef<Path>, text: &str) -> Result<(), PipelineError> {
    let mut staged = StagedOutputs::new();
    staged.stage_bytes(path, text.as_bytes())?;
    staged.commit()?;
    Ok(())
}

/// Write a table to `path` atomically, creating parent directories
///
/// # Example
///
/// ```
/// use au_emotion::features::aggregation::AggregatedRow;
/// use au_emotion::io::writer::write_csv_atomic;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("aggregated/session_task_1_aggregated.csv");
/// write_csv_atomic(&path, &[AggregatedRow::new("12:00:01 PM", "JawDrop", 0.5)])?;
///
/// let text = std::fs::read_to_string(&path)?;
/// assert_eq!(text, "Time,Expression,Weight\n12:00:01 PM,JawDrop,0.5\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_csv_atomic<T: TableRow>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), PipelineError> {
    let mut staged = StagedOutputs::new();
    staged.stage_csv(path, rows)?;
    staged.commit()?;
    Ok(())
}

/// A group of output files written to temporary files, published together
///
/// Dropping the group without calling [`StagedOutputs::commit`] removes every
/// temporary file and leaves the destinations untouched.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutputs {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged files
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Stage raw bytes for `path`
    pub fn stage_bytes(&mut self, path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), PipelineError> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        log::debug!("Staged {} bytes for {}", bytes.len(), path.display());
        self.staged.push((file, path));
        Ok(())
    }

    /// Stage a table for `path`
    pub fn stage_csv<T: TableRow>(&mut self, path: impl AsRef<Path>, rows: &[T]) -> Result<(), PipelineError> {
        let bytes = csv_bytes(rows)?;
        self.stage_bytes(path, &bytes)
    }

    /// Stage a value as pretty-printed JSON for `path`
    pub fn stage_json<T: Serialize>(&mut self, path: impl AsRef<Path>, value: &T) -> Result<(), PipelineError> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.stage_bytes(path, &bytes)
    }

    /// Rename every staged file onto its destination
    ///
    /// # Returns
    ///
    /// Destination paths in staging order
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Io` if a rename fails. Destinations published
    /// earlier in the same commit are removed and the remaining temporary files
    /// are discarded, so none of the group stays visible.
    pub fn commit(self) -> Result<Vec<PathBuf>, PipelineError> {
        let mut published = Vec::with_capacity(self.staged.len());
        for (file, path) in self.staged {
            if let Err(e) = file.persist(&path) {
                log::warn!("Could not publish {}: {}", path.display(), e.error);
                roll_back(&published);
                return Err(PipelineError::Io(e.error));
            }
            log::debug!("Wrote {}", path.display());
            published.push(path);
        }
        Ok(published)
    }
}

fn roll_back(published: &[PathBuf]) {
    for path in published {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Removed {}", path.display()),
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }
}
