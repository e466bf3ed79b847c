use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Measure – the fixed set of numeric columns
// ---------------------------------------------------------------------------

/// A numeric measurement column of the station dataset.
///
/// The set is closed: every record carries a (possibly missing) value for
/// each variant, stored at the index given by [`Measure::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Measure {
    #[serde(rename = "TEMP")]
    Temp,
    #[serde(rename = "PRES")]
    Pres,
    #[serde(rename = "DEWP")]
    Dewp,
    #[serde(rename = "RAIN")]
    Rain,
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "SO2")]
    So2,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "O3")]
    O3,
    #[serde(rename = "CO")]
    Co,
}

impl Measure {
    pub const COUNT: usize = 10;

    pub const ALL: [Measure; Measure::COUNT] = [
        Measure::Temp,
        Measure::Pres,
        Measure::Dewp,
        Measure::Rain,
        Measure::Pm25,
        Measure::Pm10,
        Measure::So2,
        Measure::No2,
        Measure::O3,
        Measure::Co,
    ];

    /// Column name in the source table.
    pub fn column(self) -> &'static str {
        match self {
            Measure::Temp => "TEMP",
            Measure::Pres => "PRES",
            Measure::Dewp => "DEWP",
            Measure::Rain => "RAIN",
            Measure::Pm25 => "PM2.5",
            Measure::Pm10 => "PM10",
            Measure::So2 => "SO2",
            Measure::No2 => "NO2",
            Measure::O3 => "O3",
            Measure::Co => "CO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Measure::Temp => "Temperature",
            Measure::Pres => "Pressure",
            Measure::Dewp => "Dew point",
            Measure::Rain => "Rainfall",
            Measure::Pm25 => "PM2.5",
            Measure::Pm10 => "PM10",
            Measure::So2 => "SO2",
            Measure::No2 => "NO2",
            Measure::O3 => "O3",
            Measure::Co => "CO",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Measure::Temp | Measure::Dewp => "°C",
            Measure::Pres => "hPa",
            Measure::Rain => "mm",
            _ => "µg/m³",
        }
    }

    /// Slot of this measure in [`Record::values`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// One hourly observation of a station.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub station: String,
    pub datetime: NaiveDateTime,
    /// Indexed by [`Measure::index`]; `None` is a missing value.
    pub values: [Option<f64>; Measure::COUNT],
}

impl Record {
    /// A record with every measurement missing.
    pub fn new(station: impl Into<String>, datetime: NaiveDateTime) -> Self {
        Record {
            station: station.into(),
            datetime,
            values: [None; Measure::COUNT],
        }
    }

    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.values[measure.index()]
    }

    /// Store a value. NaN is stored as missing.
    pub fn set(&mut self, measure: Measure, value: Option<f64>) {
        self.values[measure.index()] = value.filter(|v| !v.is_nan());
    }

    #[cfg(test)]
    pub fn with(mut self, measure: Measure, value: f64) -> Self {
        self.set(measure, Some(value));
        self
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded table. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    /// Distinct station identifiers in order of first appearance.
    stations: Vec<String>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stations = Vec::new();
        for rec in &records {
            if seen.insert(rec.station.as_str()) {
                stations.push(rec.station.clone());
            }
        }
        Dataset { records, stations }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest calendar date present, if any.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.datetime).min()?;
        let last = self.records.iter().map(|r| r.datetime).max()?;
        Some((first.date(), last.date()))
    }
}
