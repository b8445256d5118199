//! Primary emotion patterns
//!
//! Each emotion lists the Action Unit groups that must all be active. A group
//! holds equivalent AU variants (usually the left/right pair); any one of them
//! with a positive weight activates the group.

use std::collections::HashMap;

use super::Emotion;

/// AU groups required by one emotion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionPattern {
    /// Emotion the pattern detects
    pub emotion: Emotion,
    /// Required groups of equivalent AU identifiers
    pub groups: &'static [&'static [&'static str]],
}

/// Pattern table for the six primary emotions, in [`Emotion::ALL`] order
pub const PRIMARY_PATTERNS: [EmotionPattern; 6] = [
    EmotionPattern {
        emotion: Emotion::Happiness,
        groups: &[
            &["CheekRaiserL", "CheekRaiserR"],         // AU6
            &["LipCornerPullerL", "LipCornerPullerR"], // AU12
        ],
    },
    EmotionPattern {
        emotion: Emotion::Sadness,
        groups: &[
            &["InnerBrowRaiserL", "InnerBrowRaiserR"],       // AU1
            &["BrowLowererL", "BrowLowererR"],               // AU4
            &["LipCornerDepressorL", "LipCornerDepressorR"], // AU15
        ],
    },
    EmotionPattern {
        emotion: Emotion::Surprise,
        groups: &[
            &["InnerBrowRaiserL", "InnerBrowRaiserR"], // AU1
            &["OuterBrowRaiserL", "OuterBrowRaiserR"], // AU2
            &["UpperLidRaiserL", "UpperLidRaiserR"],   // AU5
            &["JawDrop"],                              // AU26
        ],
    },
    EmotionPattern {
        emotion: Emotion::Fear,
        groups: &[
            &["InnerBrowRaiserL", "InnerBrowRaiserR"], // AU1
            &["OuterBrowRaiserL", "OuterBrowRaiserR"], // AU2
            &["BrowLowererL", "BrowLowererR"],         // AU4
            &["UpperLidRaiserL", "UpperLidRaiserR"],   // AU5
            &["LipStretcherL", "LipStretcherR"],       // AU20
            &["JawDrop"],                              // AU26
        ],
    },
    EmotionPattern {
        emotion: Emotion::Anger,
        groups: &[
            &["BrowLowererL", "BrowLowererR"],       // AU4
            &["UpperLidRaiserL", "UpperLidRaiserR"], // AU5
            &["LidTightenerL", "LidTightenerR"],     // AU7
            &["LipTightenerL", "LipTightenerR"],     // AU23
            &["LipPressorL", "LipPressorR"],         // AU24
        ],
    },
    EmotionPattern {
        emotion: Emotion::Disgust,
        groups: &[
            &["NoseWrinklerL", "NoseWrinklerR"],             // AU9
            &["UpperLipRaiserL", "UpperLipRaiserR"],         // AU10
            &["LipCornerDepressorL", "LipCornerDepressorR"], // AU15
            &["LowerLipDepressorL", "LowerLipDepressorR"],   // AU16
            &["ChinRaiserB", "ChinRaiserT"],                 // AU17
        ],
    },
];

impl EmotionPattern {
    /// Look up the pattern of `emotion` in a table
    pub fn find(table: &[EmotionPattern], emotion: Emotion) -> Option<&EmotionPattern> {
        table.iter().find(|p| p.emotion == emotion)
    }

    /// Raw (unnormalized) intensity of this emotion for one second
    ///
    /// 0 unless every group is active; otherwise the mean over groups of the
    /// strongest active variant in each group.
    ///
    /// # Arguments
    ///
    /// * `weights` - Expression → weight for one second
    pub fn raw_intensity(&self, weights: &HashMap<&str, f64>) -> f64 {
        if self.groups.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for group in self.groups {
            match group_weight(group, weights) {
                Some(weight) => total += weight,
                None => return 0.0,
            }
        }
        total / self.groups.len() as f64
    }
}

/// Strongest positive weight among the group's variants, `None` if the group is inactive
fn group_weight(group: &[&str], weights: &HashMap<&str, f64>) -> Option<f64> {
    group
        .iter()
        .filter_map(|au| weights.get(au).copied())
        .filter(|w| *w > 0.0)
        .fold(None, |best, w| Some(best.map_or(w, |b: f64| b.max(w))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(pairs: &[(&'static str, f64)]) -> HashMap<&'static str, f64> {
        pairs.iter().copied().collect()
    }

    fn happiness() -> &'static EmotionPattern {
        &PRIMARY_PATTERNS[0]
    }

    #[test]
    fn test_table_covers_all_emotions_in_order() {
        let emotions: Vec<Emotion> = PRIMARY_PATTERNS.iter().map(|p| p.emotion).collect();
        assert_eq!(emotions, Emotion::ALL.to_vec());
        assert!(PRIMARY_PATTERNS.iter().all(|p| !p.groups.is_empty()));
    }

    #[test]
    fn test_all_groups_active_gives_mean_of_maxima() {
        let w = weights(&[
            ("CheekRaiserL", 0.4),
            ("CheekRaiserR", 0.6),
            ("LipCornerPullerR", 0.8),
        ]);
        assert!((happiness().raw_intensity(&w) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_group_zeroes_emotion() {
        let w = weights(&[
            ("CheekRaiserL", 0.0),
            ("CheekRaiserR", 0.0),
            ("LipCornerPullerL", 0.9),
            ("LipCornerPullerR", 0.9),
        ]);
        assert_eq!(happiness().raw_intensity(&w), 0.0);
    }

    #[test]
    fn test_missing_group_zeroes_emotion() {
        let w = weights(&[("LipCornerPullerL", 0.9)]);
        assert_eq!(happiness().raw_intensity(&w), 0.0);
    }

    #[test]
    fn test_singleton_group() {
        let surprise = EmotionPattern::find(&PRIMARY_PATTERNS, Emotion::Surprise).unwrap();
        let w = weights(&[
            ("InnerBrowRaiserL", 0.2),
            ("OuterBrowRaiserR", 0.4),
            ("UpperLidRaiserL", 0.6),
        ]);
        assert_eq!(surprise.raw_intensity(&w), 0.0);

        let mut w = w;
        w.insert("JawDrop", 0.8);
        assert!((surprise.raw_intensity(&w) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_pattern_is_inactive() {
        let pattern = EmotionPattern {
            emotion: Emotion::Fear,
            groups: &[],
        };
        assert_eq!(pattern.raw_intensity(&weights(&[("JawDrop", 1.0)])), 0.0);
    }
}
