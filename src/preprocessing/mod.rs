//! Log preprocessing modules
//!
//! This module contains the stages that prepare a raw Action Unit log for analysis:
//! - Sanitation (drop `Invalid` rows, repair comma decimal separators, validate rows)
//! - Task splitting (partition by `New level - TASK n` marker lines)

pub mod sanitizer;
pub mod task_splitter;

pub use sanitizer::{sanitize, LogEntry, LogRow, SanitizeStats, SanitizedLog, SanitizedRow};
pub use task_splitter::{split_tasks, Task, TaskMarker, TaskSplit};
