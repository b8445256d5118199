//! Second aggregation
//!
//! The tracker samples several times per second. Each sample's timestamp is cut
//! down to whole seconds and the weights of every (second, expression) pair are
//! averaged, giving one row per pair.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::io::{TableRow, EXPRESSION_COLUMN, TIME_COLUMN, WEIGHT_COLUMN};
use crate::preprocessing::SanitizedRow;

/// Mean weight of one expression within one second
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    /// Second-resolution timestamp, AM/PM retained
    #[serde(rename = "Time")]
    pub time: String,
    /// Action Unit identifier
    #[serde(rename = "Expression")]
    pub expression: String,
    /// Mean of the contributing sample weights
    #[serde(rename = "Weight")]
    pub weight: f64,
}

impl AggregatedRow {
    /// Convenience constructor
    pub fn new(time: impl Into<String>, expression: impl Into<String>, weight: f64) -> Self {
        Self {
            time: time.into(),
            expression: expression.into(),
            weight,
        }
    }
}

impl TableRow for AggregatedRow {
    const COLUMNS: &'static [&'static str] = &[TIME_COLUMN, EXPRESSION_COLUMN, WEIGHT_COLUMN];
}

/// Aggregated rows plus what had to be left out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// One row per (second, expression), seconds in order of first appearance,
    /// expressions sorted by name within a second
    pub rows: Vec<AggregatedRow>,
    /// Rows excluded because their weight was not a number
    pub dropped_non_numeric: usize,
}

/// Cut the sub-second fraction from a timestamp
///
/// The fraction is the text after the last `.` up to the next space; whatever
/// follows (the AM/PM marker) is kept. A timestamp without `.` is already at
/// second resolution and is returned unchanged.
///
/// # Example
///
/// ```
/// use au_emotion::features::aggregation::second_key;
///
/// assert_eq!(second_key("12:00:01.500 PM"), "12:00:01 PM");
/// assert_eq!(second_key("09:15:59.001"), "09:15:59");
/// assert_eq!(second_key("12:00:01 PM"), "12:00:01 PM");
/// ```
pub fn second_key(time: &str) -> String {
    match time.rfind('.') {
        Some(dot) => {
            let rest = &time[dot..];
            match rest.find(' ') {
                Some(space) => format!("{}{}", &time[..dot], &rest[space..]),
                None => time[..dot].to_string(),
            }
        }
        None => time.to_string(),
    }
}

/// Aggregate samples into one mean weight per second and expression
///
/// Rows whose weight is not finite (a non-numeric value read back from a
/// persisted table) are excluded from the averages and counted.
///
/// # Arguments
///
/// * `rows` - Sanitized rows of one task
///
/// # Returns
///
/// Aggregated rows, ordered deterministically for identical input
pub fn aggregate_by_second(rows: &[SanitizedRow]) -> Aggregation {
    let mut seconds: Vec<String> = Vec::new();
    let mut groups: HashMap<String, BTreeMap<&str, (f64, usize)>> = HashMap::new();
    let mut dropped_non_numeric = 0;

    for row in rows {
        if !row.weight.is_finite() {
            dropped_non_numeric += 1;
            continue;
        }

        let key = second_key(&row.time);
        let expressions = groups.entry(key).or_insert_with_key(|key| {
            seconds.push(key.clone());
            BTreeMap::new()
        });
        let (sum, count) = expressions.entry(row.expression.as_str()).or_insert((0.0, 0));
        *sum += row.weight;
        *count += 1;
    }

    let mut aggregated = Vec::with_capacity(groups.values().map(BTreeMap::len).sum());
    for second in seconds {
        if let Some(expressions) = groups.remove(&second) {
            for (expression, (sum, count)) in expressions {
                aggregated.push(AggregatedRow {
                    time: second.clone(),
                    expression: expression.to_string(),
                    weight: sum / count as f64,
                });
            }
        }
    }

    if dropped_non_numeric > 0 {
        log::warn!(
            "Excluded {} rows with non-numeric weights from aggregation",
            dropped_non_numeric
        );
    }
    log::debug!(
        "Aggregated {} samples into {} (second, expression) rows",
        rows.len(),
        aggregated.len()
    );

    Aggregation {
        rows: aggregated,
        dropped_non_numeric,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_key_milliseconds_collapse() {
        assert_eq!(second_key("12:00:01.100 PM"), second_key("12:00:01.900 PM"));
        assert_ne!(second_key("12:00:01.100 PM"), second_key("12:00:02.100 PM"));
        assert_ne!(second_key("12:00:01.100 AM"), second_key("12:00:01.100 PM"));
    }

    #[test]
    fn test_second_key_uses_last_dot() {
        assert_eq!(second_key("12.00.01.250 PM"), "12.00.01 PM");
    }

    #[test]
    fn test_mean_per_second() {
        let rows = vec![
            SanitizedRow::new("12:00:01.100 PM", "AU6", 0.5),
            SanitizedRow::new("12:00:01.900 PM", "AU6", 0.7),
        ];
        let result = aggregate_by_second(&rows);

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].time, "12:00:01 PM");
        assert_eq!(result.rows[0].expression, "AU6");
        assert!((result.rows[0].weight - 0.6).abs() < 1e-9);
        assert_eq!(result.dropped_non_numeric, 0);
    }

    #[test]
    fn test_unique_per_time_and_expression() {
        let rows = vec![
            SanitizedRow::new("1:00:00.100 PM", "JawDrop", 0.2),
            SanitizedRow::new("1:00:00.200 PM", "CheekRaiserL", 0.4),
            SanitizedRow::new("1:00:00.300 PM", "JawDrop", 0.4),
            SanitizedRow::new("1:00:01.100 PM", "JawDrop", 1.0),
        ];
        let result = aggregate_by_second(&rows);

        let keys: Vec<(&str, &str)> = result
            .rows
            .iter()
            .map(|r| (r.time.as_str(), r.expression.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("1:00:00 PM", "CheekRaiserL"),
                ("1:00:00 PM", "JawDrop"),
                ("1:00:01 PM", "JawDrop"),
            ]
        );
        assert!((result.rows[1].weight - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_order_follows_first_appearance() {
        // 11:59:59 PM precedes 12:00:00 AM in the log, not in lexical order
        let rows = vec![
            SanitizedRow::new("11:59:59.500 PM", "AU6", 0.1),
            SanitizedRow::new("12:00:00.500 AM", "AU6", 0.2),
        ];
        let result = aggregate_by_second(&rows);
        assert_eq!(result.rows[0].time, "11:59:59 PM");
        assert_eq!(result.rows[1].time, "12:00:00 AM");
    }

    #[test]
    fn test_order_independent_of_row_order() {
        let forward = vec![
            SanitizedRow::new("1:00:00.100 PM", "B", 0.2),
            SanitizedRow::new("1:00:00.200 PM", "A", 0.4),
            SanitizedRow::new("1:00:00.300 PM", "B", 0.6),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(aggregate_by_second(&forward), aggregate_by_second(&backward));
    }

    #[test]
    fn test_non_numeric_weights_excluded() {
        let rows = vec![
            SanitizedRow::new("1:00:00.100 PM", "AU6", 0.4),
            SanitizedRow::new("1:00:00.200 PM", "AU6", f64::NAN),
            SanitizedRow::new("1:00:00.300 PM", "AU12", f64::NAN),
        ];
        let result = aggregate_by_second(&rows);

        assert_eq!(result.rows.len(), 1);
        assert!((result.rows[0].weight - 0.4).abs() < 1e-9);
        assert_eq!(result.dropped_non_numeric, 2);
    }

    #[test]
    fn test_empty_input() {
        let result = aggregate_by_second(&[]);
        assert!(result.rows.is_empty());
    }
}
