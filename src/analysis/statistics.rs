//! Dominant emotion statistics of a final table

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::result::FinalRow;
use crate::error::PipelineError;
use crate::features::emotion::Emotion;

/// Number of final rows contributed by one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCount {
    /// Task name
    pub task: String,
    /// Timestamps in the task
    pub timestamps: usize,
}

/// Summary of one final table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionStatistics {
    /// Table name (file stem, or stem plus task name)
    pub name: String,

    /// Number of rows (one per timestamp)
    pub total_timestamps: usize,

    /// Rows per dominant label, only labels that occur
    pub counts: BTreeMap<String, usize>,

    /// Share of rows per dominant label, in percent
    pub percentages: BTreeMap<String, f64>,

    /// Mean intensity of each emotion over all rows
    pub mean_intensity: BTreeMap<String, f64>,

    /// Rows per task, for tables combining several tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_counts: Option<Vec<TaskCount>>,
}

impl EmotionStatistics {
    /// Compute statistics over final rows
    ///
    /// # Arguments
    ///
    /// * `name` - Table name
    /// * `rows` - Final rows
    /// * `task_counts` - Rows per task when `rows` combines several tasks
    ///
    /// # Example
    ///
    /// ```
    /// use au_emotion::analysis::result::{DominantEmotion, FinalRow};
    /// use au_emotion::analysis::statistics::EmotionStatistics;
    /// use au_emotion::Emotion;
    ///
    /// let rows = vec![
    ///     FinalRow::new("1", [1.0, 0.0, 0.0, 0.0, 0.0, 0.0], DominantEmotion::Emotion(Emotion::Happiness)),
    ///     FinalRow::new("2", [0.0; 6], DominantEmotion::Neutral),
    /// ];
    /// let stats = EmotionStatistics::from_rows("session", &rows, None);
    /// assert_eq!(stats.total_timestamps, 2);
    /// assert_eq!(stats.counts["neutral"], 1);
    /// assert_eq!(stats.percentages["happiness"], 50.0);
    /// ```
    pub fn from_rows(
        name: impl Into<String>,
        rows: &[FinalRow],
        task_counts: Option<Vec<TaskCount>>,
    ) -> Self {
        let total = rows.len();

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in rows {
            *counts
                .entry(row.dominant_emotion.as_str().to_string())
                .or_insert(0) += 1;
        }

        let percentages = counts
            .iter()
            .map(|(label, &count)| (label.clone(), count as f64 / total as f64 * 100.0))
            .collect();

        let mean_intensity = Emotion::ALL
            .iter()
            .map(|&emotion| {
                let mean = if total == 0 {
                    0.0
                } else {
                    rows.iter().map(|row| row.intensity(emotion)).sum::<f64>() / total as f64
                };
                (emotion.as_str().to_string(), mean)
            })
            .collect();

        Self {
            name: name.into(),
            total_timestamps: total,
            counts,
            percentages,
            mean_intensity,
            task_counts,
        }
    }

    /// Compute statistics of a persisted final table
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or lacks a final-table column
    pub fn from_final_csv(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let rows = crate::io::reader::read_final_csv(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_rows(name, &rows, None))
    }

    /// Most frequent dominant label, ties to the alphabetically first
    pub fn most_frequent(&self) -> Option<&str> {
        self.counts
            .iter()
            .fold(None, |best: Option<(&String, usize)>, (label, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
            .map(|(label, _)| label.as_str())
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for EmotionStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Emotion statistics for {}:", self.name)?;
        writeln!(f, "{}", "-".repeat(40))?;
        for (label, count) in &self.counts {
            let percentage = self.percentages.get(label).copied().unwrap_or(0.0);
            writeln!(f, "{}: {} ({:.1}%)", label, count, percentage)?;
        }
        writeln!(f, "{}", "-".repeat(40))?;
        write!(f, "Total timestamps: {}", self.total_timestamps)?;

        if let Some(tasks) = &self.task_counts {
            write!(f, "\n\nStatistics by task:")?;
            for task in tasks {
                write!(f, "\n{}: {} timestamps", task.task, task.timestamps)?;
            }
        }
        Ok(())
    }
}
