//! Analysis and result assembly modules
//!
//! Turns ranked emotion rows into the final per-second table:
//! - Finalization (dominant label with neutrality threshold)
//! - Result types
//! - Run metadata
//! - Dominant-emotion statistics

pub mod finalizer;
pub mod metadata;
pub mod result;
pub mod statistics;

pub use finalizer::finalize;
pub use metadata::RunMetadata;
pub use result::{DominantEmotion, FinalRow, LogAnalysis, TaskResult};
pub use statistics::{EmotionStatistics, TaskCount};
