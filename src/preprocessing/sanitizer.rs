//! Raw log sanitation
//!
//! Turns the text of a facial-expression log into clean, numerically parseable rows:
//! - Rows whose fields include the `Invalid` expression are dropped
//! - A weight written with a comma decimal separator (`0,85`) splits its line into
//!   four fields; the two halves are joined back with a dot
//! - The repaired text is then parsed as a CSV table, and any row that still does
//!   not yield `Time,Expression,Weight` with a numeric weight fails the whole log
//!
//! Task marker lines are recognised before any field splitting and kept as typed
//! entries, so the task splitter can run on the sanitized log.
//!
//! # Example
//!
//! ```
//! use au_emotion::preprocessing::sanitizer::sanitize;
//!
//! let log = "Time,Expression,Weight\n\
//!            12:00:01.500 PM,CheekRaiserL,0,85\n\
//!            12:00:01.600 PM,Invalid,0\n";
//! let sanitized = sanitize(log)?;
//! let rows: Vec<_> = sanitized.rows().collect();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].weight, 0.85);
//! # Ok::<(), au_emotion::PipelineError>(())
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::task_splitter::TaskMarker;
use crate::error::PipelineError;
use crate::io::{TableRow, EXPRESSION_COLUMN, TIME_COLUMN, WEIGHT_COLUMN};

/// Expression value the tracker writes when no face was found
pub const INVALID_EXPRESSION: &str = "Invalid";

/// A log row as it appears in the input, before its weight is validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// Locale-formatted timestamp with milliseconds and AM/PM marker
    pub time: String,
    /// Action Unit identifier
    pub expression: String,
    /// Raw weight text
    pub weight: String,
}

impl LogRow {
    /// Validate the weight and produce a [`SanitizedRow`]
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MalformedInput` (attributed to `line`) if the weight
    /// is not a finite decimal number
    pub fn into_sanitized(self, line: usize) -> Result<SanitizedRow, PipelineError> {
        let weight = self
            .weight
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| {
                PipelineError::malformed(line, format!("weight {:?} is not a number", self.weight))
            })?;

        Ok(SanitizedRow {
            time: self.time,
            expression: self.expression,
            weight,
        })
    }
}

/// A validated log row: known expression, numeric weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizedRow {
    /// Locale-formatted timestamp with milliseconds and AM/PM marker
    #[serde(rename = "Time")]
    pub time: String,
    /// Action Unit identifier
    #[serde(rename = "Expression")]
    pub expression: String,
    /// Activation weight
    #[serde(rename = "Weight")]
    pub weight: f64,
}

impl SanitizedRow {
    /// Convenience constructor
    pub fn new(time: impl Into<String>, expression: impl Into<String>, weight: f64) -> Self {
        Self {
            time: time.into(),
            expression: expression.into(),
            weight,
        }
    }
}

impl TableRow for SanitizedRow {
    const COLUMNS: &'static [&'static str] = &[TIME_COLUMN, EXPRESSION_COLUMN, WEIGHT_COLUMN];
}

/// One entry of a sanitized log, in file order
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    /// A data row
    Row(SanitizedRow),
    /// A task delimiter line
    Marker(TaskMarker),
}

/// Counters collected while sanitizing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeStats {
    /// Non-blank lines after the header
    pub lines_read: usize,
    /// Lines dropped because they carry the `Invalid` expression
    pub invalid_dropped: usize,
    /// Lines repaired from a comma decimal separator
    pub decimal_fixups: usize,
    /// Task marker lines kept
    pub markers: usize,
}

/// Positions of the three required columns in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    /// Position of `Time`
    pub time: usize,
    /// Position of `Expression`
    pub expression: usize,
    /// Position of `Weight`
    pub weight: usize,
}

impl ColumnIndex {
    /// Resolve column positions from header fields
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::MissingColumn` if a required column is absent and
    /// `PipelineError::MalformedInput` if the header has other than three columns
    pub fn from_header<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<Self, PipelineError> {
        let names: Vec<&str> = fields.into_iter().map(str::trim).collect();
        let position = |column: &str| {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| PipelineError::missing_column(column))
        };

        let index = Self {
            time: position(TIME_COLUMN)?,
            expression: position(EXPRESSION_COLUMN)?,
            weight: position(WEIGHT_COLUMN)?,
        };

        if names.len() != SanitizedRow::COLUMNS.len() {
            return Err(PipelineError::malformed(
                1,
                format!("expected 3 header columns, found {}", names.len()),
            ));
        }

        Ok(index)
    }

    fn field_count(&self) -> usize {
        SanitizedRow::COLUMNS.len()
    }
}

/// A sanitized log: the verbatim header plus typed entries in file order
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedLog {
    /// Header line, kept verbatim
    pub header: String,
    /// Column positions resolved from the header
    pub columns: ColumnIndex,
    /// Rows and task markers in file order
    pub entries: Vec<LogEntry>,
    /// Sanitation counters
    pub stats: SanitizeStats,
}

impl SanitizedLog {
    /// Data rows in file order
    pub fn rows(&self) -> impl Iterator<Item = &SanitizedRow> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Row(row) => Some(row),
            LogEntry::Marker(_) => None,
        })
    }

    /// Task markers in file order
    pub fn markers(&self) -> impl Iterator<Item = &TaskMarker> {
        self.entries.iter().filter_map(|entry| match entry {
            LogEntry::Marker(marker) => Some(marker),
            LogEntry::Row(_) => None,
        })
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Render the cleaned log as CSV text
    ///
    /// The result sanitizes back to the same entries, so it can be persisted and
    /// re-consumed by later stages.
    pub fn to_csv_text(&self) -> Result<String, PipelineError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for entry in &self.entries {
            match entry {
                LogEntry::Row(row) => {
                    let mut fields = vec![String::new(); self.columns.field_count()];
                    fields[self.columns.time] = row.time.clone();
                    fields[self.columns.expression] = row.expression.clone();
                    fields[self.columns.weight] = row.weight.to_string();
                    writer.write_record(&fields)?;
                }
                LogEntry::Marker(marker) => writer.write_record([marker.canonical()])?,
            }
        }

        let body = writer
            .into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))?;
        let body = String::from_utf8(body).map_err(|e| {
            PipelineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        Ok(format!("{}\n{}", self.header, body))
    }
}

/// Outcome of the line-level fixups for one line
enum LineFix<'a> {
    Invalid,
    Marker(TaskMarker),
    BadMarker,
    Repaired(String),
    Unchanged(&'a str),
}

fn fix_line<'a>(line: &'a str, columns: &ColumnIndex) -> LineFix<'a> {
    if let Some(marker) = TaskMarker::parse(line) {
        return LineFix::Marker(marker);
    }
    if TaskMarker::matches(line) {
        return LineFix::BadMarker;
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields
        .iter()
        .any(|field| field.trim().trim_matches('"') == INVALID_EXPRESSION)
    {
        return LineFix::Invalid;
    }

    // One field too many: the weight was written with a decimal comma
    if fields.len() == columns.field_count() + 1 {
        let w = columns.weight;
        let mut repaired: Vec<String> = fields[..w].iter().map(|f| f.to_string()).collect();
        repaired.push(format!("{}.{}", fields[w], fields[w + 1]));
        repaired.extend(fields[w + 2..].iter().map(|f| f.to_string()));
        return LineFix::Repaired(repaired.join(","));
    }

    LineFix::Unchanged(line)
}

/// Where a line of the repaired text came from
struct Origin {
    line: usize,
    marker: Option<TaskMarker>,
}

/// Sanitize the text of a raw log
///
/// # Arguments
///
/// * `content` - Full text of the log; the first non-blank line is the header
///
/// # Returns
///
/// The sanitized log with its counters
///
/// # Errors
///
/// - `PipelineError::MalformedInput` for an empty log or a row that cannot be
///   reconstructed into `Time,Expression,Weight` with a numeric weight
/// - `PipelineError::MissingColumn` if the header lacks a required column
pub fn sanitize(content: &str) -> Result<SanitizedLog, PipelineError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| PipelineError::malformed(1, "log is empty"))?;
    let header_fields = header_record(header, header_line)?;
    let columns = ColumnIndex::from_header(header_fields.iter())?;

    let mut stats = SanitizeStats::default();
    let mut repaired = String::with_capacity(content.len());
    let mut origins = vec![Origin {
        line: header_line,
        marker: None,
    }];
    repaired.push_str(header);
    repaired.push('\n');

    for (line_no, line) in lines {
        stats.lines_read += 1;
        match fix_line(line, &columns) {
            LineFix::Invalid => {
                log::debug!("Dropping Invalid row at line {}: {}", line_no, line);
                stats.invalid_dropped += 1;
                continue;
            }
            LineFix::BadMarker => {
                return Err(PipelineError::malformed(line_no, "task number out of range"));
            }
            LineFix::Marker(marker) => {
                stats.markers += 1;
                repaired.push_str(&marker.canonical());
                origins.push(Origin {
                    line: line_no,
                    marker: Some(marker),
                });
            }
            LineFix::Repaired(fixed) => {
                log::debug!("Repaired decimal comma at line {}: {}", line_no, fixed);
                stats.decimal_fixups += 1;
                repaired.push_str(&fixed);
                origins.push(Origin {
                    line: line_no,
                    marker: None,
                });
            }
            LineFix::Unchanged(line) => {
                repaired.push_str(line);
                origins.push(Origin {
                    line: line_no,
                    marker: None,
                });
            }
        }
        repaired.push('\n');
    }

    let entries = parse_table(&repaired, &origins, &columns)?;

    log::debug!(
        "Sanitized {} lines: {} rows kept, {} Invalid dropped, {} decimal fixups, {} markers",
        stats.lines_read,
        entries.len() - stats.markers,
        stats.invalid_dropped,
        stats.decimal_fixups,
        stats.markers
    );

    Ok(SanitizedLog {
        header: header.to_string(),
        columns,
        entries,
        stats,
    })
}

/// Split the header line with the same CSV rules as the data rows
fn header_record(header: &str, line: usize) -> Result<csv::StringRecord, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(header.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(e)) => Err(PipelineError::malformed(line, e.to_string())),
        None => Err(PipelineError::malformed(line, "header is empty")),
    }
}

/// Parse the repaired text as a CSV table
fn parse_table(
    text: &str,
    origins: &[Origin],
    columns: &ColumnIndex,
) -> Result<Vec<LogEntry>, PipelineError> {
    // Line numbers reported by the reader are 1-based positions in `text`
    let origin_of = |text_line: u64| origins.get((text_line as usize).saturating_sub(1));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut entries = Vec::with_capacity(origins.len().saturating_sub(1));
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e
                .position()
                .and_then(|p| origin_of(p.line()))
                .map_or(0, |o| o.line);
            PipelineError::malformed(line, e.to_string())
        })?;

        let origin = record.position().and_then(|p| origin_of(p.line()));
        let line_no = origin.map_or(0, |o| o.line);

        if let Some(marker) = origin.and_then(|o| o.marker) {
            entries.push(LogEntry::Marker(marker));
            continue;
        }

        if record.len() != columns.field_count() {
            return Err(PipelineError::malformed(
                line_no,
                format!("expected 3 fields, found {}", record.len()),
            ));
        }

        let row = LogRow {
            time: record[columns.time].to_string(),
            expression: record[columns.expression].to_string(),
            weight: record[columns.weight].to_string(),
        };
        entries.push(LogEntry::Row(row.into_sanitized(line_no)?));
    }

    Ok(entries)
}

/// Sanitize a log file and persist the cleaned text as `sanitized_<file name>`
///
/// # Arguments
///
/// * `path` - Raw log file
/// * `output_dir` - Directory receiving the cleaned copy (created if missing)
///
/// # Returns
///
/// Path of the cleaned copy and the sanitized log
pub fn sanitize_file(
    path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<(PathBuf, SanitizedLog), PipelineError> {
    let path = path.as_ref();
    log::info!("Sanitizing {}", path.display());

    let content = crate::io::reader::read_log(path)?;
    let sanitized = sanitize(&content)?;

    let output = output_dir
        .as_ref()
        .join(format!("sanitized_{}", crate::io::reader::file_name(path)));
    crate::io::writer::write_text_atomic(&output, &sanitized.to_csv_text()?)?;

    log::info!("Sanitized log saved as {}", output.display());
    Ok((output, sanitized))
}
