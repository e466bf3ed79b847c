use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Dataset, Measure, Record};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a dataset file is rejected. Rows are numbered from 0, not
/// counting the header.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
    #[error("row {row}, column {column}: '{value}' is not a number")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a station dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `station`, `datetime` (or `year`, `month`,
///   `day`, `hour`) and the measurement columns
/// * `.json`    – `[{ "station": "...", "datetime": "...", "TEMP": 1.5, ... }, ...]`
/// * `.parquet` – same columns; `datetime` as string, date or timestamp
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} records for {} stations from {}",
        dataset.len(),
        dataset.stations().len(),
        path.display()
    );
    Ok(dataset)
}

// -- Cell parsing shared by all formats --

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp cell. A bare date means midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a measurement cell. `Ok(None)` is a missing value.
fn parse_measure(s: &str) -> std::result::Result<Option<f64>, ()> {
    let s = s.trim();
    if s.is_empty() || matches!(s, "NA" | "N/A" | "nan" | "NaN" | "null" | "None") {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(|_| ())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// How the timestamp is spread over the CSV columns.
#[derive(Clone, Copy)]
enum TimeColumns {
    Datetime(usize),
    /// Raw PRSA layout: separate `year`, `month`, `day`, `hour` columns.
    Parts([usize; 4]),
}

/// Read CSV data. Columns other than the station, time and measurement
/// columns (e.g. `No`, `wd`, `WSPM`) are ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let station_idx = position("station").ok_or_else(|| LoadError::MissingColumn("station".into()))?;

    let time_cols = match position("datetime") {
        Some(i) => TimeColumns::Datetime(i),
        None => {
            let mut parts = [0usize; 4];
            for (slot, name) in parts.iter_mut().zip(["year", "month", "day", "hour"]) {
                *slot = position(name).ok_or_else(|| LoadError::MissingColumn("datetime".into()))?;
            }
            TimeColumns::Parts(parts)
        }
    };

    let measure_cols: Vec<(Measure, usize)> = Measure::ALL
        .into_iter()
        .filter_map(|m| match position(m.column()) {
            Some(i) => Some((m, i)),
            None => {
                log::warn!("CSV has no '{}' column; treating it as missing", m.column());
                None
            }
        })
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |i: usize| row.get(i).unwrap_or("");

        let datetime = match time_cols {
            TimeColumns::Datetime(i) => parse_datetime(cell(i)),
            TimeColumns::Parts(parts) => datetime_from_parts(parts.map(cell)),
        }
        .ok_or_else(|| LoadError::BadTimestamp {
            row: row_no,
            value: match time_cols {
                TimeColumns::Datetime(i) => cell(i).to_string(),
                TimeColumns::Parts(parts) => parts.map(cell).join("/"),
            },
        })?;

        let mut record = Record::new(cell(station_idx).trim(), datetime);
        for &(measure, idx) in &measure_cols {
            let raw = cell(idx);
            let value = parse_measure(raw).map_err(|_| LoadError::BadNumber {
                row: row_no,
                column: measure.column().to_string(),
                value: raw.to_string(),
            })?;
            record.set(measure, value);
        }
        records.push(record);
    }

    Ok(Dataset::from_records(records))
}

fn datetime_from_parts([year, month, day, hour]: [&str; 4]) -> Option<NaiveDateTime> {
    let year: i32 = year.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let day: u32 = day.trim().parse().ok()?;
    let hour: u32 = hour.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`
/// with `date_format='iso'`):
///
/// ```json
/// [
///   { "station": "Aotizhongxin", "datetime": "2013-03-01 00:00:00",
///     "TEMP": -0.7, "PRES": 1023.0, "PM2.5": 4.0, "CO": null },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let station = obj
            .get("station")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| LoadError::MissingColumn("station".into()))
            .with_context(|| format!("Row {i}"))?;

        let raw_time = obj
            .get("datetime")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| LoadError::MissingColumn("datetime".into()))
            .with_context(|| format!("Row {i}"))?;
        let datetime = parse_datetime(raw_time).ok_or_else(|| LoadError::BadTimestamp {
            row: i,
            value: raw_time.to_string(),
        })?;

        let mut record = Record::new(station, datetime);
        for measure in Measure::ALL {
            let value = match obj.get(measure.column()) {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::Number(n)) => n.as_f64(),
                Some(JsonValue::String(s)) => parse_measure(s).map_err(|_| LoadError::BadNumber {
                    row: i,
                    column: measure.column().to_string(),
                    value: s.clone(),
                })?,
                Some(other) => {
                    return Err(LoadError::BadNumber {
                        row: i,
                        column: measure.column().to_string(),
                        value: other.to_string(),
                    }
                    .into())
                }
            };
            record.set(measure, value);
        }
        records.push(record);
    }

    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the station table.
///
/// Expected schema:
/// - `station`: Utf8 or LargeUtf8
/// - `datetime`: Utf8, Date32 or Timestamp (any unit, timezone ignored)
/// - measurement columns: Float64, Float32, Int64, Int32 or Utf8, nullable
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for (batch_no, batch_result) in reader.enumerate() {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let offset = records.len();

        let station_col = batch.column(
            schema
                .index_of("station")
                .map_err(|_| LoadError::MissingColumn("station".into()))?,
        );
        let time_col = batch.column(
            schema
                .index_of("datetime")
                .map_err(|_| LoadError::MissingColumn("datetime".into()))?,
        );

        let measure_cols: Vec<(Measure, &Arc<dyn Array>)> = Measure::ALL
            .into_iter()
            .filter_map(|m| match schema.index_of(m.column()) {
                Ok(i) => Some((m, batch.column(i))),
                Err(_) => {
                    if batch_no == 0 {
                        log::warn!("Parquet file has no '{}' column; treating it as missing", m.column());
                    }
                    None
                }
            })
            .collect();

        for row in 0..batch.num_rows() {
            let row_no = offset + row;
            let station = extract_string(station_col, row)
                .with_context(|| format!("Row {row_no}: failed to read 'station'"))?;
            let datetime = extract_datetime(time_col, row, row_no)
                .with_context(|| format!("Row {row_no}: failed to read 'datetime'"))?
                .ok_or(LoadError::BadTimestamp {
                    row: row_no,
                    value: "null".into(),
                })?;

            let mut record = Record::new(station, datetime);
            for &(measure, col) in &measure_cols {
                let value = extract_f64(col, row, row_no, measure)
                    .with_context(|| format!("Row {row_no}: failed to read '{measure}'"))?;
                record.set(measure, value);
            }
            records.push(record);
        }
    }

    Ok(Dataset::from_records(records))
}

// -- Parquet / Arrow helpers --

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null station");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => Ok(downcast::<LargeStringArray>(col)?.value(row).to_string()),
        other => bail!("Expected string column, got {other:?}"),
    }
}

fn extract_datetime(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
) -> Result<Option<NaiveDateTime>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let dt = match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = extract_string(col, row)?;
            match parse_datetime(&text) {
                Some(dt) => Some(dt),
                None => {
                    return Err(LoadError::BadTimestamp {
                        row: row_no,
                        value: text,
                    }
                    .into())
                }
            }
        }
        DataType::Date32 => downcast::<Date32Array>(col)?.value_as_datetime(row),
        DataType::Timestamp(TimeUnit::Second, _) => {
            downcast::<TimestampSecondArray>(col)?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            downcast::<TimestampMillisecondArray>(col)?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            downcast::<TimestampMicrosecondArray>(col)?.value_as_datetime(row)
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            downcast::<TimestampNanosecondArray>(col)?.value_as_datetime(row)
        }
        other => bail!("Expected string, date or timestamp column, got {other:?}"),
    };
    Ok(dt)
}

/// Extract a measurement; Arrow nulls are missing values. String columns
/// go through the same cell parsing as CSV.
fn extract_f64(
    col: &Arc<dyn Array>,
    row: usize,
    row_no: usize,
    measure: Measure,
) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let bad_number = |value: String| LoadError::BadNumber {
        row: row_no,
        column: measure.column().to_string(),
        value,
    };
    let v = match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row),
        DataType::Float32 => downcast::<Float32Array>(col)?.value(row) as f64,
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row) as f64,
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row) as f64,
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = extract_string(col, row)?;
            return parse_measure(&text).map_err(|_| bad_number(text).into());
        }
        other => return Err(bad_number(format!("<{other:?}>")).into()),
    };
    Ok(Some(v))
}
