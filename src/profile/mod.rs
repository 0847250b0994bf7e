//! Damaged capacity-factor profiles: loading, resampling and application.

pub mod apply;
pub mod resample;
pub mod synth;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

pub use apply::apply_damaged_profile;
pub use resample::{ReconciledProfile, Resolution, reconcile, resample_mean, snapshot_step};

/// Timestamp formats accepted in the index column, tried in order.
const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Format used when writing profiles.
const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time-indexed table of capacity factors, one column per bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Row timestamps.
    pub index: Vec<NaiveDateTime>,
    /// Column labels (bus names).
    pub columns: Vec<String>,
    /// Row-major values; every row has `columns.len()` entries.
    pub rows: Vec<Vec<f64>>,
}

impl Profile {
    /// Creates a profile, checking that the shape is consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Profile`] if the row count differs from the
    /// index length or a row has the wrong width.
    pub fn new(
        index: Vec<NaiveDateTime>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> DispatchResult<Self> {
        if index.len() != rows.len() {
            return Err(DispatchError::Profile(format!(
                "{} index entries for {} rows",
                index.len(),
                rows.len()
            )));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(DispatchError::Profile(format!(
                "row {i} has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self {
            index,
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Position of the column labelled `name`.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.column_position(name)?;
        Some(self.rows.iter().map(|r| r[j]).collect())
    }

    /// Keeps only the first `n` rows.
    pub fn truncate(&mut self, n: usize) {
        self.index.truncate(n);
        self.rows.truncate(n);
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

/// Reads a damaged profile from a CSV file.
///
/// The first column holds timestamps; every other column is a bus.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a timestamp or value does
/// not parse, or the table is ragged.
pub fn read_profile_csv(path: &Path) -> DispatchResult<Profile> {
    let file = File::open(path)?;
    let profile = read_profile_from(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        rows = profile.len(),
        columns = profile.columns.len(),
        "damaged profile loaded"
    );
    Ok(profile)
}

/// Reads a damaged profile from any CSV reader.
pub fn read_profile_from(reader: impl Read) -> DispatchResult<Profile> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(DispatchError::Profile(
            "expected a time column followed by at least one bus column".to_string(),
        ));
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut index = Vec::new();
    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_time = record.get(0).unwrap_or_default();
        let time = parse_timestamp(raw_time).ok_or_else(|| {
            DispatchError::Profile(format!("row {line}: cannot parse timestamp \"{raw_time}\""))
        })?;
        let values = record
            .iter()
            .skip(1)
            .zip(&columns)
            .map(|(raw, column)| {
                parse_value(raw).ok_or_else(|| {
                    DispatchError::Profile(format!(
                        "row {line}, column \"{column}\": cannot parse \"{raw}\""
                    ))
                })
            })
            .collect::<DispatchResult<Vec<f64>>>()?;
        index.push(time);
        rows.push(values);
    }

    Profile::new(index, columns, rows)
}

/// Writes a profile as CSV with a leading `time` column.
pub fn write_profile_csv(profile: &Profile, writer: impl Write) -> DispatchResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(std::iter::once("time").chain(profile.columns.iter().map(String::as_str)))?;
    for (time, row) in profile.index.iter().zip(&profile.rows) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(time.format(WRITE_FORMAT).to_string());
        record.extend(row.iter().map(|v| format!("{v:.6}")));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a profile CSV to `path`.
pub fn export_profile_csv(profile: &Profile, path: &Path) -> DispatchResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut buf = BufWriter::new(file);
    write_profile_csv(profile, &mut buf)?;
    buf.flush()?;
    Ok(())
}
