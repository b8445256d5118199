//! Dominant emotion finalization
//!
//! Collapses the six ranked emotion rows of each second into one row carrying
//! every intensity plus the dominant label.

use std::collections::HashMap;

use super::result::{DominantEmotion, FinalRow};
use crate::features::emotion::{Emotion, EmotionRow};

/// Collapse emotion rows into one final row per second
///
/// # Arguments
///
/// * `rows` - Emotion rows of one task
/// * `threshold` - Neutrality threshold in [0, 1]
///
/// # Returns
///
/// One row per distinct time, in order of first appearance. The dominant
/// emotion is the one with the highest intensity, ties going to the earliest
/// in [`Emotion::ALL`]; it is replaced by neutral when strictly below
/// `threshold`. The intensity columns are never altered.
///
/// # Example
///
/// ```
/// use au_emotion::analysis::finalizer::finalize;
/// use au_emotion::analysis::result::DominantEmotion;
/// use au_emotion::features::emotion::{Emotion, EmotionRow};
///
/// let rows = vec![
///     EmotionRow::new("12:00:01 PM", Emotion::Anger, 0.15),
///     EmotionRow::new("12:00:01 PM", Emotion::Fear, 0.1),
/// ];
/// let finals = finalize(&rows, 0.2);
/// assert_eq!(finals.len(), 1);
/// assert_eq!(finals[0].dominant_emotion, DominantEmotion::Neutral);
/// assert_eq!(finals[0].anger, 0.15);
/// ```
pub fn finalize(rows: &[EmotionRow], threshold: f64) -> Vec<FinalRow> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut timeline: Vec<(&str, [f64; 6])> = Vec::new();

    for row in rows {
        let position = *positions.entry(row.time.as_str()).or_insert_with(|| {
            timeline.push((row.time.as_str(), [0.0; 6]));
            timeline.len() - 1
        });
        timeline[position].1[row.emotion.precedence()] = row.intensity;
    }

    let finals: Vec<FinalRow> = timeline
        .into_iter()
        .map(|(time, intensities)| FinalRow::new(time, intensities, dominant(&intensities, threshold)))
        .collect();

    let neutral = finals
        .iter()
        .filter(|row| row.dominant_emotion == DominantEmotion::Neutral)
        .count();
    log::debug!(
        "Finalized {} timestamps ({} neutral at threshold {})",
        finals.len(),
        neutral,
        threshold
    );

    finals
}

/// Dominant label for intensities in [`Emotion::ALL`] order
fn dominant(intensities: &[f64; 6], threshold: f64) -> DominantEmotion {
    let mut best = Emotion::ALL[0];
    let mut best_intensity = intensities[0];
    for (&emotion, &intensity) in Emotion::ALL.iter().zip(intensities.iter()).skip(1) {
        if intensity > best_intensity {
            best = emotion;
            best_intensity = intensity;
        }
    }

    if best_intensity < threshold {
        DominantEmotion::Neutral
    } else {
        DominantEmotion::Emotion(best)
    }
}
