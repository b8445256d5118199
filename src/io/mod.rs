//! Table I/O modules
//!
//! Reading raw logs and persisted tables, and writing result tables atomically.
//! Every per-stage row type implements [`TableRow`] so that readers can check
//! for missing columns and writers can emit a header even for empty tables.

pub mod reader;
pub mod writer;

use serde::Serialize;

/// Timestamp column shared by every table
pub const TIME_COLUMN: &str = "Time";
/// Action Unit identifier column of the log tables
pub const EXPRESSION_COLUMN: &str = "Expression";
/// Activation weight column of the log tables
pub const WEIGHT_COLUMN: &str = "Weight";
/// Emotion label column of the emotion table
pub const EMOTION_COLUMN: &str = "Emotion";
/// Normalized intensity column of the emotion table
pub const INTENSITY_COLUMN: &str = "Intensity";
/// Dominant label column of the final table
pub const DOMINANT_COLUMN: &str = "DominantEmotion";

/// A typed row of one pipeline table
pub trait TableRow: Serialize {
    /// Column names, in the order the row serializes its fields
    const COLUMNS: &'static [&'static str];
}

/// Return the first of `required` that is not among `headers`
pub(crate) fn first_missing<'a>(
    headers: &csv::StringRecord,
    required: &[&'a str],
) -> Option<&'a str> {
    required
        .iter()
        .copied()
        .find(|column| !headers.iter().any(|h| h.trim() == *column))
}
