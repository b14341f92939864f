//! CSV table loading

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::records::{MetricKey, MetricRecord, MetricRow};
use crate::error::LoadError;

/// Read every row of `path` as `T`, keeping the line each row came from
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<(u64, T)>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                return Err(LoadError::Row {
                    path: path.to_path_buf(),
                    line: e.position().map(csv::Position::line),
                    message: e.to_string(),
                });
            }
        }

        let line = record.position().map_or(0, csv::Position::line);
        let row = record
            .deserialize::<T>(Some(&headers))
            .map_err(|e| LoadError::Row {
                path: path.to_path_buf(),
                line: Some(line),
                message: describe(&e),
            })?;
        rows.push((line, row));
    }

    debug!(path = %path.display(), rows = rows.len(), "Loaded CSV table");
    Ok(rows)
}

/// Read a table whose rows need no validation beyond their types
pub(crate) fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    Ok(read_rows(path)?.into_iter().map(|(_, row)| row).collect())
}

/// Read and validate the metrics table
///
/// Rejects quarters outside 1-4, non-finite values and duplicate
/// (ticker, period, metric) identities.
pub(crate) fn read_metrics(path: &Path) -> Result<Vec<MetricRecord>, LoadError> {
    let rows: Vec<(u64, MetricRow)> = read_rows(path)?;
    let mut seen: HashMap<MetricKey, u64> = HashMap::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        let record = MetricRecord::try_from(row).map_err(|message| LoadError::Row {
            path: path.to_path_buf(),
            line: Some(line),
            message,
        })?;

        let key = record.key();
        if let Some(&first_line) = seen.get(&key) {
            return Err(LoadError::DuplicateMetric {
                path: path.to_path_buf(),
                line,
                first_line,
                key: key.to_string(),
            });
        }
        seen.insert(key, line);
        records.push(record);
    }

    Ok(records)
}

/// Deserialization error without the csv crate's position prefix
fn describe(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(field) => format!("field {}: {}", field + 1, err.kind()),
            None => err.kind().to_string(),
        },
        _ => error.to_string(),
    }
}
