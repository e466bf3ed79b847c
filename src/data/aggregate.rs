use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Serialize, Serializer};

use super::filter::FilteredView;
use super::model::{Measure, Record};

// ---------------------------------------------------------------------------
// Mean accumulator (skip-missing)
// ---------------------------------------------------------------------------

/// Running arithmetic mean that ignores missing values.
///
/// A missing value contributes neither to the sum nor to the count, so an
/// accumulator that only ever saw missing values reports `None` rather
/// than zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| !v.is_nan()) {
            self.sum += v;
            self.count += 1;
        }
    }

    /// The mean, or `None` when nothing was accumulated.
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean of one field over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldAverage {
    pub measure: Measure,
    /// `None` is the undefined sentinel: no usable value.
    pub mean: Option<f64>,
}

/// Reduce a group of records to the per-field means, in `fields` order.
pub fn reduce_means<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    fields: &[Measure],
) -> Vec<FieldAverage> {
    let mut acc = vec![Mean::default(); fields.len()];
    for rec in records {
        for (slot, &field) in acc.iter_mut().zip(fields) {
            slot.push(rec.get(field));
        }
    }
    fields
        .iter()
        .zip(acc)
        .map(|(&measure, m)| FieldAverage {
            measure,
            mean: m.value(),
        })
        .collect()
}

/// Render an average for display, spelling out the undefined sentinel.
pub fn format_mean(mean: Option<f64>) -> String {
    match mean {
        Some(v) => format!("{v:.2}"),
        None => "undefined".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Group-by primitive
// ---------------------------------------------------------------------------

/// Group items by key. Groups come back ordered by key; items inside a
/// group keep their input order.
pub fn group_by_key<I, K, F>(items: I, mut key: F) -> BTreeMap<K, Vec<I::Item>>
where
    I: IntoIterator,
    K: Ord,
    F: FnMut(&I::Item) -> K,
{
    let mut groups: BTreeMap<K, Vec<I::Item>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

// ---------------------------------------------------------------------------
// AverageSummary
// ---------------------------------------------------------------------------

/// Means of a fixed set of fields over a [`FilteredView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageSummary {
    pub entries: Vec<FieldAverage>,
}

impl AverageSummary {
    #[cfg(test)]
    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.measure == measure)
            .and_then(|e| e.mean)
    }

    /// True when no field has a usable mean.
    pub fn is_undefined(&self) -> bool {
        self.entries.iter().all(|e| e.mean.is_none())
    }
}

pub fn compute_averages(view: &FilteredView<'_>, fields: &[Measure]) -> AverageSummary {
    AverageSummary {
        entries: reduce_means(view.iter(), fields),
    }
}

// ---------------------------------------------------------------------------
// Calendar month key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based.
    pub month: u32,
}

impl YearMonth {
    pub fn of(datetime: &NaiveDateTime) -> Self {
        YearMonth {
            year: datetime.year(),
            month: datetime.month(),
        }
    }

    /// Months since year 0; consecutive months differ by one.
    pub fn ordinal(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn from_ordinal(ordinal: i64) -> Self {
        YearMonth {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// MonthlySeries
// ---------------------------------------------------------------------------

/// Per-field means of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub month: YearMonth,
    pub values: Vec<FieldAverage>,
}

impl MonthlyPoint {
    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.measure == measure)
            .and_then(|v| v.mean)
    }
}

/// A view grouped by calendar month. Means are computed on iteration, and
/// [`MonthlySeries::iter`] can be called any number of times.
#[derive(Debug, Clone)]
pub struct MonthlySeries<'a> {
    groups: BTreeMap<YearMonth, Vec<&'a Record>>,
    fields: Vec<Measure>,
}

impl<'a> MonthlySeries<'a> {
    /// Months ascending. Months without records do not appear.
    pub fn iter(&self) -> impl Iterator<Item = MonthlyPoint> + '_ {
        self.groups.iter().map(|(&month, records)| MonthlyPoint {
            month,
            values: reduce_means(records.iter().copied(), &self.fields),
        })
    }

    /// Records that fell into `month`.
    #[cfg(test)]
    pub fn records_in(&self, month: YearMonth) -> &[&'a Record] {
        self.groups.get(&month).map(Vec::as_slice).unwrap_or(&[])
    }
}

pub fn compute_monthly_trend<'a>(view: &FilteredView<'a>, fields: &[Measure]) -> MonthlySeries<'a> {
    MonthlySeries {
        groups: group_by_key(view.iter(), |r| YearMonth::of(&r.datetime)),
        fields: fields.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter_by_station_and_range;
    use crate::data::model::Dataset;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn march_april() -> Dataset {
        Dataset::from_records(vec![
            Record::new("A", at(2013, 3, 1)).with(Measure::Temp, 10.0),
            Record::new("A", at(2013, 3, 15)).with(Measure::Temp, 20.0),
            Record::new("A", at(2013, 4, 1)),
            Record::new("B", at(2013, 3, 20)).with(Measure::Temp, 99.0),
        ])
    }

    #[test]
    fn missing_values_are_skipped_not_zeroed() {
        let ds = march_april();
        let view = filter_by_station_and_range(&ds, "A", at(2013, 3, 1), at(2013, 4, 1));
        assert_eq!(view.len(), 3);

        let avg = compute_averages(&view, &[Measure::Temp, Measure::Pres]);
        assert_eq!(avg.get(Measure::Temp), Some(15.0));
        assert_eq!(avg.get(Measure::Pres), None);
        assert!(!avg.is_undefined());
    }

    #[test]
    fn monthly_trend_marks_empty_month_undefined() {
        let ds = march_april();
        let view = filter_by_station_and_range(&ds, "A", at(2013, 3, 1), at(2013, 4, 1));
        let series = compute_monthly_trend(&view, &[Measure::Temp]);

        let points: Vec<MonthlyPoint> = series.iter().collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, YearMonth { year: 2013, month: 3 });
        assert_eq!(points[0].get(Measure::Temp), Some(15.0));
        assert_eq!(points[1].month, YearMonth { year: 2013, month: 4 });
        assert_eq!(points[1].get(Measure::Temp), None);

        // Iterating again yields the same sequence.
        assert_eq!(series.iter().collect::<Vec<_>>(), points);
    }

    #[test]
    fn empty_view_gives_undefined_everywhere() {
        let ds = march_april();
        let view = filter_by_station_and_range(&ds, "nowhere", at(2013, 1, 1), at(2014, 1, 1));
        assert!(view.is_empty());

        let avg = compute_averages(&view, &Measure::ALL);
        assert_eq!(avg.entries.len(), Measure::COUNT);
        assert!(avg.is_undefined());

        let series = compute_monthly_trend(&view, &Measure::ALL);
        assert_eq!(series.iter().count(), 0);
    }

    #[test]
    fn months_strictly_increase_and_skip_gaps() {
        let ds = Dataset::from_records(vec![
            Record::new("A", at(2014, 1, 3)).with(Measure::Co, 900.0),
            Record::new("A", at(2013, 11, 30)).with(Measure::Co, 700.0),
            Record::new("A", at(2013, 11, 2)).with(Measure::Co, 500.0),
            Record::new("A", at(2014, 1, 20)).with(Measure::Co, 1100.0),
        ]);
        let view = filter_by_station_and_range(&ds, "A", at(2013, 1, 1), at(2015, 1, 1));
        let series = compute_monthly_trend(&view, &[Measure::Co]);
        let months: Vec<YearMonth> = series.iter().map(|p| p.month).collect();

        assert_eq!(
            months,
            vec![YearMonth { year: 2013, month: 11 }, YearMonth { year: 2014, month: 1 }]
        );
        assert!(months.windows(2).all(|w| w[0] < w[1]));

        for point in series.iter() {
            for rec in series.records_in(point.month) {
                assert_eq!(YearMonth::of(&rec.datetime), point.month);
                assert!(view.iter().any(|v| std::ptr::eq(v, *rec)));
            }
        }
        assert_eq!(series.iter().next().unwrap().get(Measure::Co), Some(600.0));
    }

    #[test]
    fn group_by_key_keeps_item_order_within_groups() {
        let groups = group_by_key(vec![5, 2, 8, 3, 6], |n| n % 2);
        assert_eq!(groups[&0], vec![2, 8, 6]);
        assert_eq!(groups[&1], vec![5, 3]);
    }

    #[test]
    fn year_month_ordinal_and_display() {
        let ym = YearMonth { year: 2016, month: 12 };
        assert_eq!(YearMonth::from_ordinal(ym.ordinal()), ym);
        assert_eq!(
            YearMonth::from_ordinal(ym.ordinal() + 1),
            YearMonth { year: 2017, month: 1 }
        );
        assert_eq!(ym.to_string(), "2016-12");
        assert_eq!(format_mean(None), "undefined");
        assert_eq!(format_mean(Some(1.0 / 3.0)), "0.33");
    }
}
