//! Analysis result types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::metadata::RunMetadata;
use crate::features::aggregation::AggregatedRow;
use crate::features::emotion::{Emotion, EmotionRow};
use crate::io::{TableRow, DOMINANT_COLUMN, TIME_COLUMN};

/// Label written for a timestamp whose strongest emotion is below the threshold
pub const NEUTRAL_LABEL: &str = "neutral";

/// Dominant label of one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DominantEmotion {
    /// The strongest emotion reached the threshold
    Emotion(Emotion),
    /// No emotion reached the threshold
    Neutral,
}

impl DominantEmotion {
    /// Label used in tables (`"happiness"`, ..., `"neutral"`)
    ///
    /// # Example
    ///
    /// ```
    /// use au_emotion::analysis::result::DominantEmotion;
    /// use au_emotion::Emotion;
    ///
    /// assert_eq!(DominantEmotion::Emotion(Emotion::Fear).as_str(), "fear");
    /// assert_eq!(DominantEmotion::Neutral.as_str(), "neutral");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            DominantEmotion::Emotion(emotion) => emotion.as_str(),
            DominantEmotion::Neutral => NEUTRAL_LABEL,
        }
    }

    /// The emotion, unless the label is neutral
    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            DominantEmotion::Emotion(emotion) => Some(*emotion),
            DominantEmotion::Neutral => None,
        }
    }
}

impl fmt::Display for DominantEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DominantEmotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == NEUTRAL_LABEL {
            return Ok(DominantEmotion::Neutral);
        }
        s.parse().map(DominantEmotion::Emotion)
    }
}

impl Serialize for DominantEmotion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DominantEmotion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// One row of the final table: all six intensities plus the dominant label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRow {
    /// Second-resolution timestamp
    #[serde(rename = "Time")]
    pub time: String,
    /// Normalized happiness intensity
    pub happiness: f64,
    /// Normalized sadness intensity
    pub sadness: f64,
    /// Normalized surprise intensity
    pub surprise: f64,
    /// Normalized fear intensity
    pub fear: f64,
    /// Normalized anger intensity
    pub anger: f64,
    /// Normalized disgust intensity
    pub disgust: f64,
    /// Strongest emotion, or neutral below the threshold
    #[serde(rename = "DominantEmotion")]
    pub dominant_emotion: DominantEmotion,
}

impl FinalRow {
    /// Build a row from intensities given in [`Emotion::ALL`] order
    pub fn new(time: impl Into<String>, intensities: [f64; 6], dominant_emotion: DominantEmotion) -> Self {
        let [happiness, sadness, surprise, fear, anger, disgust] = intensities;
        Self {
            time: time.into(),
            happiness,
            sadness,
            surprise,
            fear,
            anger,
            disgust,
            dominant_emotion,
        }
    }

    /// Intensity of one emotion
    pub fn intensity(&self, emotion: Emotion) -> f64 {
        match emotion {
            Emotion::Happiness => self.happiness,
            Emotion::Sadness => self.sadness,
            Emotion::Surprise => self.surprise,
            Emotion::Fear => self.fear,
            Emotion::Anger => self.anger,
            Emotion::Disgust => self.disgust,
        }
    }

    /// All six intensities in [`Emotion::ALL`] order
    pub fn intensities(&self) -> [f64; 6] {
        Emotion::ALL.map(|emotion| self.intensity(emotion))
    }
}

impl TableRow for FinalRow {
    const COLUMNS: &'static [&'static str] = &[
        TIME_COLUMN,
        "happiness",
        "sadness",
        "surprise",
        "fear",
        "anger",
        "disgust",
        DOMINANT_COLUMN,
    ];
}

/// Every stage output of one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    /// Exported 1-based task index
    pub index: u32,
    /// Task name (`task_<index>`)
    pub name: String,
    /// Per-second mean weights
    pub aggregated: Vec<AggregatedRow>,
    /// Ranked emotion intensities per second
    pub emotions: Vec<EmotionRow>,
    /// Final table of the task
    pub rows: Vec<FinalRow>,
    /// Rows excluded from aggregation for a non-numeric weight
    pub dropped_non_numeric: usize,
}

impl TaskResult {
    /// Number of timestamps labelled neutral
    pub fn neutral_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.dominant_emotion == DominantEmotion::Neutral)
            .count()
    }
}

/// Complete analysis of one log
#[derive(Debug, Clone)]
pub struct LogAnalysis {
    /// Name of the analysed log (file name, or caller-chosen label)
    pub source: String,
    /// Surviving tasks in task order
    pub tasks: Vec<TaskResult>,
    /// Run diagnostics
    pub metadata: RunMetadata,
}

impl LogAnalysis {
    /// All tasks' final rows concatenated in task order
    pub fn combined_rows(&self) -> Vec<FinalRow> {
        self.tasks
            .iter()
            .flat_map(|task| task.rows.iter().cloned())
            .collect()
    }

    /// Number of final rows per task name, in task order
    pub fn task_counts(&self) -> Vec<(String, usize)> {
        self.tasks
            .iter()
            .map(|task| (task.name.clone(), task.rows.len()))
            .collect()
    }

    /// Look up a task by exported index
    pub fn task(&self, index: u32) -> Option<&TaskResult> {
        self.tasks.iter().find(|task| task.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_labels() {
        assert_eq!("neutral".parse::<DominantEmotion>(), Ok(DominantEmotion::Neutral));
        assert_eq!(
            "anger".parse::<DominantEmotion>(),
            Ok(DominantEmotion::Emotion(Emotion::Anger))
        );
        assert!("calm".parse::<DominantEmotion>().is_err());
        assert_eq!(DominantEmotion::Neutral.emotion(), None);
        assert_eq!(
            DominantEmotion::Emotion(Emotion::Sadness).to_string(),
            "sadness"
        );
    }

    #[test]
    fn test_final_row_json_shape() {
        let row = FinalRow::new(
            "12:00:01 PM",
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            DominantEmotion::Emotion(Emotion::Happiness),
        );
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Time"], "12:00:01 PM");
        assert_eq!(json["happiness"], 1.0);
        assert_eq!(json["DominantEmotion"], "happiness");

        let back: FinalRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_final_row_intensities_follow_precedence() {
        let row = FinalRow::new("t", [0.1, 0.2, 0.3, 0.4, 0.0, 0.0], DominantEmotion::Neutral);
        assert_eq!(row.intensity(Emotion::Fear), 0.4);
        assert_eq!(row.intensities(), [0.1, 0.2, 0.3, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_columns_match_serialization_order() {
        let row = FinalRow::new("t", [0.0; 6], DominantEmotion::Neutral);
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(&row).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, FinalRow::COLUMNS.join(","));
    }
}
