//! Feature extraction modules
//!
//! This module contains the per-task stages that turn sanitized Action Unit
//! samples into emotion intensities:
//! - Second aggregation (mean weight per second and expression)
//! - Emotion detection (all-or-nothing AU group patterns, normalized per second)

pub mod aggregation;
pub mod emotion;
