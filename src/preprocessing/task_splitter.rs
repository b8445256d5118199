//! Task splitting
//!
//! A recording session is one log file; the stimulus software writes a marker
//! line such as `### New level - TASK 3 ###` whenever the subject moves on to the
//! next task. The splitter partitions the sanitized log at those markers:
//!
//! - Rows before the first marker form task 1
//! - Rows after a marker numbered `n` form task `n + 1`
//! - A log without markers is task 1 in its entirety
//!
//! Segments without data rows are dropped with a warning, and so are tasks whose
//! exported index is in the excluded set.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::sanitizer::{LogEntry, SanitizedLog, SanitizedRow};
use crate::error::PipelineError;

static TASK_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#+\s*New level - TASK\s+(\d+)\s*#+").expect("task marker pattern is valid")
});

/// A task delimiter line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskMarker {
    /// Task number declared by the marker
    pub number: u32,
}

impl TaskMarker {
    /// Recognise a marker line
    ///
    /// Returns `None` if the line is not a marker or its number does not fit in `u32`.
    ///
    /// # Example
    ///
    /// ```
    /// use au_emotion::preprocessing::TaskMarker;
    ///
    /// assert_eq!(TaskMarker::parse("### New level - TASK 4 ###").map(|m| m.number), Some(4));
    /// assert_eq!(TaskMarker::parse("#New level - TASK   12#,,").map(|m| m.number), Some(12));
    /// assert!(TaskMarker::parse("New level - TASK 4").is_none());
    /// assert!(TaskMarker::parse("### new level - task 4 ###").is_none());
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let captures = TASK_MARKER.captures(line)?;
        let number = captures.get(1)?.as_str().parse().ok()?;
        Some(Self { number })
    }

    /// Whether the line has the shape of a marker, whatever its number
    ///
    /// True for every line `parse` accepts, and also for markers whose number
    /// does not fit in `u32`.
    pub fn matches(line: &str) -> bool {
        TASK_MARKER.is_match(line)
    }

    /// Task index used for naming output: the declared number plus one
    pub fn exported_index(&self) -> u32 {
        self.number.saturating_add(1)
    }

    /// Marker text as written back into a sanitized log
    pub fn canonical(&self) -> String {
        format!("### New level - TASK {} ###", self.number)
    }
}

/// One task segment of a log
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Exported 1-based task index
    pub index: u32,
    /// Rows of the segment, in file order
    pub rows: Vec<SanitizedRow>,
}

impl Task {
    /// Create a task from its rows
    pub fn new(index: u32, rows: Vec<SanitizedRow>) -> Self {
        Self { index, rows }
    }

    /// Task name used for output routing, e.g. `task_3`
    pub fn name(&self) -> String {
        task_name(self.index)
    }
}

/// Name of the task with the given exported index
pub fn task_name(index: u32) -> String {
    format!("task_{}", index)
}

/// Result of splitting a log into tasks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSplit {
    /// Tasks with data, in order of first appearance
    pub tasks: Vec<Task>,
    /// Marker lines seen
    pub markers_found: usize,
    /// Exported indices of segments dropped because they had no data rows
    pub empty_segments: Vec<u32>,
    /// Exported indices dropped by the exclusion policy
    pub excluded: Vec<u32>,
}

impl TaskSplit {
    /// Recoverable errors for the empty segments that were dropped
    pub fn warnings(&self) -> Vec<PipelineError> {
        self.empty_segments
            .iter()
            .map(|&task| PipelineError::EmptySegment { task })
            .collect()
    }
}

/// Split a sanitized log into tasks
///
/// # Arguments
///
/// * `sanitized` - Sanitized log with its marker entries
/// * `excluded` - Exported task indices to drop
///
/// # Returns
///
/// The tasks plus what was dropped. Two segments with the same exported index
/// (e.g. rows before the first marker and a `TASK 0` marker) are merged in file
/// order so task names stay unique.
pub fn split_tasks(sanitized: &SanitizedLog, excluded: &BTreeSet<u32>) -> TaskSplit {
    let mut split = TaskSplit::default();

    // Leading rows belong to task 1; nothing to report if there are none
    let mut current = Segment {
        index: 1,
        rows: Vec::new(),
        leading: true,
    };

    for entry in &sanitized.entries {
        match entry {
            LogEntry::Row(row) => current.rows.push(row.clone()),
            LogEntry::Marker(marker) => {
                log::debug!(
                    "Found marker for TASK {} (exported as task {})",
                    marker.number,
                    marker.exported_index()
                );
                split.markers_found += 1;
                let next = Segment {
                    index: marker.exported_index(),
                    rows: Vec::new(),
                    leading: false,
                };
                finish_segment(std::mem::replace(&mut current, next), excluded, &mut split);
            }
        }
    }

    // Without markers the leading segment is the whole log, so an empty one is reported
    if split.markers_found == 0 {
        current.leading = false;
    }
    finish_segment(current, excluded, &mut split);

    log::info!(
        "Split log into {} task(s) from {} marker(s); {} empty, {} excluded",
        split.tasks.len(),
        split.markers_found,
        split.empty_segments.len(),
        split.excluded.len()
    );

    split
}

struct Segment {
    index: u32,
    rows: Vec<SanitizedRow>,
    leading: bool,
}

fn finish_segment(segment: Segment, excluded: &BTreeSet<u32>, split: &mut TaskSplit) {
    if segment.rows.is_empty() {
        if !segment.leading {
            let warning = PipelineError::EmptySegment {
                task: segment.index,
            };
            log::warn!("{}, skipping", warning);
            split.empty_segments.push(segment.index);
        }
        return;
    }

    if excluded.contains(&segment.index) {
        log::warn!(
            "Task {} is excluded, dropping {} rows",
            segment.index,
            segment.rows.len()
        );
        split.excluded.push(segment.index);
        return;
    }

    if let Some(existing) = split.tasks.iter_mut().find(|t| t.index == segment.index) {
        log::warn!(
            "Task {} appears more than once, appending {} rows",
            segment.index,
            segment.rows.len()
        );
        existing.rows.extend(segment.rows);
        return;
    }

    log::debug!("Task {}: {} rows", segment.index, segment.rows.len());
    split.tasks.push(Task::new(segment.index, segment.rows));
}
