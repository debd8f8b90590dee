//! Tabular view of time-bucketed KPI responses.
//!
//! `getKpiStation*` and `getDevKpi*` answer with a list of `{collectTime, dataItemMap}`
//! records. [`flatten_kpi_records`] turns that list into one row per `collectTime`, with every
//! `dataItemMap` key as a floating point column.

use crate::api::Error;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiTable {
    columns: Vec<String>,
    index: Vec<DateTime<Utc>>,
    rows: Vec<Vec<f64>>,
}

impl KpiTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn rows(&self) -> impl Iterator<Item = (&DateTime<Utc>, &[f64])> {
        self.index.iter().zip(self.rows.iter().map(Vec::as_slice))
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let position = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[position]).collect())
    }

    pub fn get(&self, at: &DateTime<Utc>, column: &str) -> Option<f64> {
        let row = self.index.iter().position(|t| t == at)?;
        let position = self.columns.iter().position(|c| c == column)?;
        Some(self.rows[row][position])
    }
}

/// CSV with a `collectTime` column in RFC 3339.
impl fmt::Display for KpiTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collectTime")?;
        for column in &self.columns {
            write!(f, ",{}", column)?;
        }
        writeln!(f)?;

        for (time, row) in self.rows() {
            write!(f, "{}", time.to_rfc3339())?;
            for value in row {
                if value.is_nan() {
                    write!(f, ",")?;
                } else {
                    write!(f, ",{}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn collect_time(record: &Map<String, Value>) -> Result<DateTime<Utc>, Error> {
    let raw = record
        .get("collectTime")
        .ok_or_else(|| Error::Table("record without collectTime".to_string()))?;

    let millis = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| Error::Table(format!("collectTime is not a timestamp: {}", raw)))?;

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::Table(format!("collectTime out of range: {}", millis)))
}

fn to_float(column: &str, value: &Value) -> Result<f64, Error> {
    match value {
        Value::Null => Ok(f64::NAN),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Table(format!("{}: {} is not a float", column, n))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Table(format!("{}: cannot convert {:?} to float", column, s))),
        other => Err(Error::Table(format!(
            "{}: cannot convert {} to float",
            column, other
        ))),
    }
}

/// Flatten a decoded `data` list into a [`KpiTable`].
///
/// Columns are the union of all `dataItemMap` keys, sorted by name. Keys missing from a record,
/// and `null` values, become `NaN`.
pub fn flatten_kpi_records(data: &Value) -> Result<KpiTable, Error> {
    let records = data
        .as_array()
        .ok_or_else(|| Error::Table(format!("expected a list of records, got {}", data)))?;

    let mut index = Vec::with_capacity(records.len());
    let mut columns = BTreeSet::new();
    let mut parsed: Vec<Vec<(&str, f64)>> = Vec::with_capacity(records.len());

    for record in records {
        let record = record
            .as_object()
            .ok_or_else(|| Error::Table(format!("record is not an object: {}", record)))?;
        index.push(collect_time(record)?);

        let mut cells = Vec::new();
        if let Some(items) = record.get("dataItemMap").and_then(Value::as_object) {
            for (key, value) in items {
                columns.insert(key.as_str());
                cells.push((key.as_str(), to_float(key, value)?));
            }
        }
        parsed.push(cells);
    }

    let columns: Vec<&str> = columns.into_iter().collect();
    let rows = parsed
        .into_iter()
        .map(|cells| {
            let mut row = vec![f64::NAN; columns.len()];
            for (key, value) in cells {
                if let Ok(position) = columns.binary_search(&key) {
                    row[position] = value;
                }
            }
            row
        })
        .collect();

    Ok(KpiTable {
        columns: columns.into_iter().map(String::from).collect(),
        index,
        rows,
    })
}
