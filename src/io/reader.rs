//! Reading raw logs and persisted tables

use std::path::Path;

use serde::de::DeserializeOwned;

use super::{first_missing, TableRow, EXPRESSION_COLUMN, TIME_COLUMN, WEIGHT_COLUMN};
use crate::analysis::result::FinalRow;
use crate::error::PipelineError;
use crate::preprocessing::{SanitizedRow, TaskMarker};

/// Read the full text of a raw log
///
/// A leading UTF-8 byte order mark is removed.
///
/// # Errors
///
/// Returns `PipelineError::Io` if the file cannot be read or is not UTF-8
pub fn read_log(path: impl AsRef<Path>) -> Result<String, PipelineError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    log::debug!("Read {} bytes from {}", content.len(), path.display());
    Ok(match content.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// File name of `path` as text (`"log"` if it has none)
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string())
}

/// File name of `path` without its extension (`"log"` if it has none)
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_string())
}

/// Re-read a persisted sanitized table
///
/// Marker lines are skipped. Weights that do not parse are kept as NaN so the
/// aggregator can exclude and count them; each one is logged.
///
/// # Errors
///
/// - `PipelineError::MissingColumn` if `Time`, `Expression` or `Weight` is absent
/// - `PipelineError::MalformedInput` if a row is shorter than the header
pub fn read_sanitized_csv(path: impl AsRef<Path>) -> Result<Vec<SanitizedRow>, PipelineError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    if let Some(column) = first_missing(&headers, SanitizedRow::COLUMNS) {
        return Err(PipelineError::missing_column(column));
    }
    let position = |column: &str| headers.iter().position(|h| h.trim() == column).unwrap_or(0);
    let (time, expression, weight) = (
        position(TIME_COLUMN),
        position(EXPRESSION_COLUMN),
        position(WEIGHT_COLUMN),
    );

    let mut rows = Vec::new();
    let mut non_numeric = 0;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);

        if record.get(0).and_then(TaskMarker::parse).is_some() {
            continue;
        }

        let field = |i: usize| {
            record.get(i).ok_or_else(|| {
                PipelineError::malformed(line, format!("expected {} fields, found {}", headers.len(), record.len()))
            })
        };
        let raw_weight = field(weight)?;
        let value = match raw_weight.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                let err = PipelineError::NonNumericWeight {
                    line,
                    value: raw_weight.to_string(),
                };
                log::warn!("{} in {}", err, path.display());
                non_numeric += 1;
                f64::NAN
            }
        };
        rows.push(SanitizedRow::new(field(time)?, field(expression)?, value));
    }

    log::debug!(
        "Read {} sanitized rows from {} ({} non-numeric weights)",
        rows.len(),
        path.display(),
        non_numeric
    );
    Ok(rows)
}

/// Read any table whose rows deserialize by column name
///
/// # Errors
///
/// Returns `PipelineError::MissingColumn` if a column of `T` is absent, or a
/// CSV error if a row does not deserialize
pub fn read_table<T: TableRow + DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, PipelineError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    if let Some(column) = first_missing(reader.headers()?, T::COLUMNS) {
        return Err(PipelineError::missing_column(column));
    }

    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Re-read a persisted final table
///
/// # Errors
///
/// Returns `PipelineError::MissingColumn` if a final-table column (including
/// `DominantEmotion`) is absent
pub fn read_final_csv(path: impl AsRef<Path>) -> Result<Vec<FinalRow>, PipelineError> {
    read_table(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::DominantEmotion;
    use crate::features::aggregation::AggregatedRow;
    use crate::features::emotion::Emotion;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_read_log_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "log.csv", "\u{feff}Time,Expression,Weight\n");
        assert_eq!(read_log(&path).unwrap(), "Time,Expression,Weight\n");
    }

    #[test]
    fn test_names() {
        let path = Path::new("/data/run/session_01.csv");
        assert_eq!(file_name(path), "session_01.csv");
        assert_eq!(file_stem(path), "session_01");
    }

    #[test]
    fn test_read_sanitized_coerces_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "sanitized.csv",
            "Time,Expression,Weight\n\
             12:00:01.100 PM,AU6,0.5\n\
             ### New level - TASK 1 ###\n\
             12:00:01.200 PM,AU6,abc\n",
        );

        let rows = read_sanitized_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].weight, 0.5);
        assert!(rows[1].weight.is_nan());
    }

    #[test]
    fn test_read_sanitized_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "sanitized.csv", "Time,Weight\n12:00:01 PM,0.5\n");
        match read_sanitized_csv(&path) {
            Err(PipelineError::MissingColumn { column }) => assert_eq!(column, "Expression"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_read_final_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "final.csv",
            "Time,happiness,sadness,surprise,fear,anger,disgust,DominantEmotion\n\
             12:00:01 PM,1.0,0.0,0.0,0.0,0.0,0.0,happiness\n\
             12:00:02 PM,0.0,0.0,0.0,0.0,0.0,0.0,neutral\n",
        );

        let rows = read_final_csv(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].dominant_emotion, DominantEmotion::Emotion(Emotion::Happiness));
        assert_eq!(rows[1].dominant_emotion, DominantEmotion::Neutral);
    }

    #[test]
    fn test_read_final_missing_dominant_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "final.csv",
            "Time,happiness,sadness,surprise,fear,anger,disgust\n12:00:01 PM,1,0,0,0,0,0\n",
        );
        match read_final_csv(&path) {
            Err(PipelineError::MissingColumn { column }) => assert_eq!(column, "DominantEmotion"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_read_aggregated_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "agg.csv", "Time,Expression,Weight\n12:00:01 PM,JawDrop,0.25\n");
        let rows: Vec<AggregatedRow> = read_table(&path).unwrap();
        assert_eq!(rows, vec![AggregatedRow::new("12:00:01 PM", "JawDrop", 0.25)]);
    }
}
