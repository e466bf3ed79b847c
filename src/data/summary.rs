use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;

use super::aggregate::{compute_averages, compute_monthly_trend, AverageSummary, MonthlyPoint};
use super::filter::{apply_selection, Selection};
use super::model::{Dataset, Measure};

/// Fields of the climate table.
pub const CLIMATE_FIELDS: [Measure; 4] = [Measure::Temp, Measure::Pres, Measure::Dewp, Measure::Rain];
/// Fields of the particulate bar chart.
pub const PARTICULATE_FIELDS: [Measure; 2] = [Measure::Pm25, Measure::Pm10];
/// Fields of the gas trend chart, in legend order.
pub const GAS_TREND_FIELDS: [Measure; 3] = [Measure::So2, Measure::O3, Measure::No2];
pub const CO_TREND_FIELDS: [Measure; 1] = [Measure::Co];

/// Everything the dashboard shows for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub station: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Number of records matching the selection.
    pub matched: usize,
    pub climate: AverageSummary,
    pub particulates: AverageSummary,
    pub gas_trend: Vec<MonthlyPoint>,
    pub co_trend: Vec<MonthlyPoint>,
}

impl DashboardSummary {
    /// Filter once, then derive every panel from that view.
    pub fn compute(dataset: &Dataset, selection: &Selection) -> Self {
        let view = apply_selection(dataset, selection);
        if view.is_empty() {
            log::info!(
                "no records for {} between {} and {}",
                selection.station,
                selection.start,
                selection.end
            );
        } else {
            log::debug!(
                "selection {} [{} .. {}] matched {} records",
                selection.station,
                selection.start,
                selection.end,
                view.len()
            );
        }

        DashboardSummary {
            station: selection.station.clone(),
            start: selection.start,
            end: selection.end,
            matched: view.len(),
            climate: compute_averages(&view, &CLIMATE_FIELDS),
            particulates: compute_averages(&view, &PARTICULATE_FIELDS),
            gas_trend: compute_monthly_trend(&view, &GAS_TREND_FIELDS).iter().collect(),
            co_trend: compute_monthly_trend(&view, &CO_TREND_FIELDS).iter().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing summary")
    }

    /// Write the summary as pretty-printed JSON.
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::YearMonth;
    use crate::data::model::Record;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dataset() -> Dataset {
        let at = |d: NaiveDate, h: u32| d.and_hms_opt(h, 0, 0).unwrap();
        Dataset::from_records(vec![
            Record::new("Dongsi", at(day(2013, 3, 1), 0))
                .with(Measure::Temp, 2.0)
                .with(Measure::Pm25, 40.0)
                .with(Measure::So2, 10.0)
                .with(Measure::Co, 800.0),
            Record::new("Dongsi", at(day(2013, 3, 1), 23))
                .with(Measure::Temp, 4.0)
                .with(Measure::Pm25, 60.0)
                .with(Measure::Co, 1000.0),
            Record::new("Dongsi", at(day(2013, 4, 2), 12))
                .with(Measure::Pm10, 120.0)
                .with(Measure::O3, 55.0),
            Record::new("Tiantan", at(day(2013, 3, 1), 5)).with(Measure::Temp, 50.0),
        ])
    }

    #[test]
    fn summary_covers_every_panel() {
        let ds = dataset();
        let sel = Selection::from_dates("Dongsi", day(2013, 3, 1), day(2013, 4, 30));
        let s = DashboardSummary::compute(&ds, &sel);

        assert_eq!(s.matched, 3);
        assert_eq!(s.climate.get(Measure::Temp), Some(3.0));
        assert_eq!(s.climate.get(Measure::Rain), None);
        assert_eq!(s.particulates.get(Measure::Pm25), Some(50.0));
        assert_eq!(s.particulates.get(Measure::Pm10), Some(120.0));

        assert_eq!(s.gas_trend.len(), 2);
        assert_eq!(s.gas_trend[0].get(Measure::So2), Some(10.0));
        assert_eq!(s.gas_trend[1].get(Measure::So2), None);
        assert_eq!(s.gas_trend[1].get(Measure::O3), Some(55.0));
        assert_eq!(s.co_trend[0].month, YearMonth { year: 2013, month: 3 });
        assert_eq!(s.co_trend[0].get(Measure::Co), Some(900.0));
    }

    #[test]
    fn unknown_station_summary_is_empty() {
        let ds = dataset();
        let sel = Selection::from_dates("Gucheng", day(2013, 1, 1), day(2017, 1, 1));
        let s = DashboardSummary::compute(&ds, &sel);
        assert_eq!(s.matched, 0);
        assert!(s.climate.is_undefined());
        assert!(s.particulates.is_undefined());
        assert!(s.gas_trend.is_empty());
        assert!(s.co_trend.is_empty());
    }

    #[test]
    fn export_writes_null_for_undefined() {
        let ds = dataset();
        let sel = Selection::from_dates("Dongsi", day(2013, 3, 1), day(2013, 3, 1));
        let s = DashboardSummary::compute(&ds, &sel);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        s.export_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["station"], "Dongsi");
        assert_eq!(value["matched"], 2);
        assert_eq!(value["climate"]["entries"][0]["measure"], "TEMP");
        assert_eq!(value["climate"]["entries"][3]["mean"], serde_json::Value::Null);
        assert_eq!(value["co_trend"][0]["month"], "2013-03");
    }
}
