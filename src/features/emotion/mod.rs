//! Emotion detection modules
//!
//! Detect the six primary emotions from aggregated Action Unit weights using:
//! - A static pattern table (each emotion requires a set of AU groups)
//! - All-or-nothing group gating and per-second normalization

pub mod detector;
pub mod patterns;

pub use detector::{detect_emotions, detect_emotions_with};
pub use patterns::{EmotionPattern, PRIMARY_PATTERNS};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::io::{TableRow, EMOTION_COLUMN, INTENSITY_COLUMN, TIME_COLUMN};

/// Primary emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// Happiness (AU6 + AU12)
    Happiness,
    /// Sadness (AU1 + AU4 + AU15)
    Sadness,
    /// Surprise (AU1 + AU2 + AU5 + AU26)
    Surprise,
    /// Fear (AU1 + AU2 + AU4 + AU5 + AU20 + AU26)
    Fear,
    /// Anger (AU4 + AU5 + AU7 + AU23 + AU24)
    Anger,
    /// Disgust (AU9 + AU10 + AU15 + AU16 + AU17)
    Disgust,
}

impl Emotion {
    /// All emotions, in precedence order
    ///
    /// This order breaks ties between equal intensities everywhere in the crate.
    pub const ALL: [Emotion; 6] = [
        Emotion::Happiness,
        Emotion::Sadness,
        Emotion::Surprise,
        Emotion::Fear,
        Emotion::Anger,
        Emotion::Disgust,
    ];

    /// Lowercase label used in tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happiness => "happiness",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
            Emotion::Fear => "fear",
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
        }
    }

    /// Position in [`Emotion::ALL`]
    pub fn precedence(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s.trim())
            .ok_or_else(|| format!("unknown emotion {:?}", s))
    }
}

/// Normalized intensity of one emotion at one second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRow {
    /// Second-resolution timestamp
    #[serde(rename = "Time")]
    pub time: String,
    /// Emotion
    #[serde(rename = "Emotion")]
    pub emotion: Emotion,
    /// Intensity in [0, 1]; the six intensities of a second sum to 1 or are all 0
    #[serde(rename = "Intensity")]
    pub intensity: f64,
}

impl EmotionRow {
    /// Convenience constructor
    pub fn new(time: impl Into<String>, emotion: Emotion, intensity: f64) -> Self {
        Self {
            time: time.into(),
            emotion,
            intensity,
        }
    }
}

impl TableRow for EmotionRow {
    const COLUMNS: &'static [&'static str] = &[TIME_COLUMN, EMOTION_COLUMN, INTENSITY_COLUMN];
}
