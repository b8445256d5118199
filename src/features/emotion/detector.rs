//! Emotion detection from aggregated Action Unit weights
//!
//! Every second is handled on its own:
//! 1. Build an expression → weight lookup for the second
//! 2. Compute each emotion's raw intensity from its pattern (all groups or nothing)
//! 3. Normalize so the six intensities sum to 1 (left at 0 if nothing matched)
//! 4. Emit the six emotions ranked by intensity, ties in [`Emotion::ALL`] order

use std::collections::HashMap;

use super::patterns::{EmotionPattern, PRIMARY_PATTERNS};
use super::{Emotion, EmotionRow};
use crate::features::aggregation::AggregatedRow;

/// Detect primary emotions with the built-in pattern table
///
/// # Arguments
///
/// * `rows` - Aggregated rows of one task
///
/// # Returns
///
/// Six rows per distinct time, times in order of first appearance
///
/// # Example
///
/// ```
/// use au_emotion::features::aggregation::AggregatedRow;
/// use au_emotion::features::emotion::{detect_emotions, Emotion};
///
/// let rows = vec![
///     AggregatedRow::new("12:00:01 PM", "CheekRaiserL", 0.8),
///     AggregatedRow::new("12:00:01 PM", "LipCornerPullerR", 0.6),
/// ];
/// let emotions = detect_emotions(&rows);
/// assert_eq!(emotions.len(), 6);
/// assert_eq!(emotions[0].emotion, Emotion::Happiness);
/// assert!((emotions[0].intensity - 1.0).abs() < 1e-9);
/// ```
pub fn detect_emotions(rows: &[AggregatedRow]) -> Vec<EmotionRow> {
    detect_emotions_with(rows, &PRIMARY_PATTERNS)
}

/// Detect primary emotions with a custom pattern table
///
/// An emotion without a pattern in `patterns` always has intensity 0, so six
/// rows are still emitted per time.
pub fn detect_emotions_with(rows: &[AggregatedRow], patterns: &[EmotionPattern]) -> Vec<EmotionRow> {
    let timeline = weights_by_time(rows);
    let mut detected = Vec::with_capacity(timeline.len() * Emotion::ALL.len());
    let mut unmatched = 0;

    for (time, weights) in &timeline {
        let mut intensities: Vec<(Emotion, f64)> = Emotion::ALL
            .iter()
            .map(|&emotion| {
                let raw = EmotionPattern::find(patterns, emotion)
                    .map_or(0.0, |pattern| pattern.raw_intensity(weights));
                (emotion, raw)
            })
            .collect();

        let total: f64 = intensities.iter().map(|(_, raw)| raw).sum();
        if total > 0.0 {
            for (_, intensity) in intensities.iter_mut() {
                *intensity /= total;
            }
        } else {
            unmatched += 1;
        }

        // Stable sort keeps precedence order among equal intensities
        intensities.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        detected.extend(
            intensities
                .into_iter()
                .map(|(emotion, intensity)| EmotionRow::new(*time, emotion, intensity)),
        );
    }

    log::debug!(
        "Detected emotions for {} timestamps ({} without any matching pattern)",
        timeline.len(),
        unmatched
    );

    detected
}

/// Group weights by time, times in order of first appearance
fn weights_by_time(rows: &[AggregatedRow]) -> Vec<(&str, HashMap<&str, f64>)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut timeline: Vec<(&str, HashMap<&str, f64>)> = Vec::new();

    for row in rows {
        let position = *positions.entry(row.time.as_str()).or_insert_with(|| {
            timeline.push((row.time.as_str(), HashMap::new()));
            timeline.len() - 1
        });
        timeline[position]
            .1
            .insert(row.expression.as_str(), row.weight);
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intensities_at<'a>(rows: &'a [EmotionRow], time: &str) -> Vec<&'a EmotionRow> {
        rows.iter().filter(|r| r.time == time).collect()
    }

    #[test]
    fn test_six_rows_per_time() {
        let rows = vec![
            AggregatedRow::new("1:00:00 PM", "JawDrop", 0.3),
            AggregatedRow::new("1:00:01 PM", "JawDrop", 0.3),
        ];
        let emotions = detect_emotions(&rows);
        assert_eq!(emotions.len(), 12);
        assert_eq!(intensities_at(&emotions, "1:00:00 PM").len(), 6);
        assert_eq!(emotions[0].time, "1:00:00 PM");
        assert_eq!(emotions[6].time, "1:00:01 PM");
    }

    #[test]
    fn test_no_pattern_leaves_all_zero_in_precedence_order() {
        let rows = vec![AggregatedRow::new("1:00:00 PM", "JawDrop", 0.9)];
        let emotions = detect_emotions(&rows);

        assert!(emotions.iter().all(|r| r.intensity == 0.0));
        let order: Vec<Emotion> = emotions.iter().map(|r| r.emotion).collect();
        assert_eq!(order, Emotion::ALL.to_vec());
    }

    #[test]
    fn test_partial_activation_does_not_count() {
        let rows = vec![
            AggregatedRow::new("1:00:00 PM", "CheekRaiserL", 0.0),
            AggregatedRow::new("1:00:00 PM", "CheekRaiserR", 0.0),
            AggregatedRow::new("1:00:00 PM", "LipCornerPullerL", 0.9),
            AggregatedRow::new("1:00:00 PM", "LipCornerPullerR", 0.9),
        ];
        let emotions = detect_emotions(&rows);
        let happiness = emotions
            .iter()
            .find(|r| r.emotion == Emotion::Happiness)
            .unwrap();
        assert_eq!(happiness.intensity, 0.0);
    }

    #[test]
    fn test_normalized_and_ranked() {
        // Happiness raw 0.5; sadness raw 0.3 (AU1, AU4, AU15); surprise/fear/anger/disgust 0
        let rows = vec![
            AggregatedRow::new("1:00:00 PM", "CheekRaiserL", 0.5),
            AggregatedRow::new("1:00:00 PM", "LipCornerPullerL", 0.5),
            AggregatedRow::new("1:00:00 PM", "InnerBrowRaiserR", 0.3),
            AggregatedRow::new("1:00:00 PM", "BrowLowererL", 0.3),
            AggregatedRow::new("1:00:00 PM", "LipCornerDepressorL", 0.3),
        ];
        let emotions = detect_emotions(&rows);

        let sum: f64 = emotions.iter().map(|r| r.intensity).sum();
        assert!((sum - 1.0).abs() < 1e-9);

        assert_eq!(emotions[0].emotion, Emotion::Happiness);
        assert!((emotions[0].intensity - 0.625).abs() < 1e-9);
        assert_eq!(emotions[1].emotion, Emotion::Sadness);
        assert!((emotions[1].intensity - 0.375).abs() < 1e-9);

        for pair in emotions.windows(2) {
            assert!(pair[0].intensity >= pair[1].intensity);
        }
    }

    #[test]
    fn test_equal_intensities_ranked_by_precedence() {
        // Surprise and fear share the same maxima when AU4 and AU20 match the others
        let rows = vec![
            AggregatedRow::new("1:00:00 PM", "InnerBrowRaiserL", 0.4),
            AggregatedRow::new("1:00:00 PM", "OuterBrowRaiserL", 0.4),
            AggregatedRow::new("1:00:00 PM", "UpperLidRaiserL", 0.4),
            AggregatedRow::new("1:00:00 PM", "JawDrop", 0.4),
            AggregatedRow::new("1:00:00 PM", "BrowLowererL", 0.4),
            AggregatedRow::new("1:00:00 PM", "LipStretcherL", 0.4),
        ];
        let emotions = detect_emotions(&rows);

        // sadness needs AU15, anger needs AU7/23/24: both inactive
        assert_eq!(emotions[0].emotion, Emotion::Surprise);
        assert_eq!(emotions[1].emotion, Emotion::Fear);
        assert!((emotions[0].intensity - 0.5).abs() < 1e-9);
        assert!((emotions[1].intensity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_custom_table_missing_emotion_still_emitted() {
        let table = [EmotionPattern {
            emotion: Emotion::Anger,
            groups: &[&["JawDrop"]],
        }];
        let rows = vec![AggregatedRow::new("1:00:00 PM", "JawDrop", 0.2)];
        let emotions = detect_emotions_with(&rows, &table);

        assert_eq!(emotions.len(), 6);
        assert_eq!(emotions[0].emotion, Emotion::Anger);
        assert!((emotions[0].intensity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_times_are_independent() {
        let rows = vec![
            AggregatedRow::new("1:00:00 PM", "CheekRaiserL", 0.5),
            AggregatedRow::new("1:00:01 PM", "LipCornerPullerL", 0.5),
        ];
        let emotions = detect_emotions(&rows);
        assert!(emotions.iter().all(|r| r.intensity == 0.0));
    }
}
