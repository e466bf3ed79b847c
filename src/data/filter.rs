use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// Selection: station plus inclusive time window
// ---------------------------------------------------------------------------

/// The user's current choice of station and time window. Both bounds are
/// inclusive. `start > end` is allowed and selects nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub station: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Selection {
    /// Whole-day selection: from 00:00 on `start` through the last instant
    /// of `end`.
    pub fn from_dates(station: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Selection {
            station: station.into(),
            start: start.and_time(NaiveTime::MIN),
            end: end_of_day(end),
        }
    }
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999999999 always exists for a naive time.
    let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
    date.and_time(last)
}

// ---------------------------------------------------------------------------
// FilteredView
// ---------------------------------------------------------------------------

/// Records of a dataset matching a [`Selection`], in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    records: Vec<&'a Record>,
}

impl<'a> FilteredView<'a> {
    pub fn from_records(records: Vec<&'a Record>) -> Self {
        FilteredView { records }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Keep the records of `station` whose datetime lies in `[start, end]`.
///
/// An unknown station or an inverted window yields an empty view.
pub fn filter_by_station_and_range<'a>(
    dataset: &'a Dataset,
    station: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> FilteredView<'a> {
    if start > end {
        return FilteredView::from_records(Vec::new());
    }
    let records = dataset
        .records()
        .iter()
        .filter(|r| r.station == station && start <= r.datetime && r.datetime <= end)
        .collect();
    FilteredView { records }
}

/// [`filter_by_station_and_range`] driven by a [`Selection`].
pub fn apply_selection<'a>(dataset: &'a Dataset, selection: &Selection) -> FilteredView<'a> {
    filter_by_station_and_range(dataset, &selection.station, selection.start, selection.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> Dataset {
        let mut records = Vec::new();
        for (i, station) in ["A", "B", "A", "C", "A", "B"].iter().enumerate() {
            records.push(Record::new(*station, at(2013, 3, 1 + i as u32 * 5, 6)));
        }
        Dataset::from_records(records)
    }

    #[test]
    fn unknown_station_is_empty() {
        let ds = sample();
        let view = filter_by_station_and_range(&ds, "Z", at(2000, 1, 1, 0), at(2100, 1, 1, 0));
        assert!(view.is_empty());
    }

    #[test]
    fn every_result_satisfies_both_predicates() {
        let ds = sample();
        let start = at(2013, 3, 3, 0);
        let end = at(2013, 3, 21, 6);
        for station in ["A", "B", "C"] {
            let view = filter_by_station_and_range(&ds, station, start, end);
            for rec in view.iter() {
                assert_eq!(rec.station, station);
                assert!(start <= rec.datetime && rec.datetime <= end);
            }
        }
        let a = filter_by_station_and_range(&ds, "A", start, end);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn bounds_are_inclusive_and_order_preserved() {
        let ds = sample();
        let view = filter_by_station_and_range(&ds, "A", at(2013, 3, 1, 6), at(2013, 3, 21, 6));
        let dates: Vec<_> = view.iter().map(|r| r.datetime).collect();
        assert_eq!(dates, vec![at(2013, 3, 1, 6), at(2013, 3, 11, 6), at(2013, 3, 21, 6)]);
    }

    #[test]
    fn inverted_window_is_empty() {
        let ds = sample();
        for station in ["A", "B", "C", "Z"] {
            let view = filter_by_station_and_range(&ds, station, at(2013, 4, 1, 0), at(2013, 3, 1, 0));
            assert!(view.is_empty());
        }
    }

    #[test]
    fn whole_day_selection_includes_late_hours() {
        let ds = Dataset::from_records(vec![
            Record::new("A", at(2013, 3, 1, 0)),
            Record::new("A", at(2013, 3, 1, 23)),
            Record::new("A", at(2013, 3, 2, 0)),
        ]);
        let day = NaiveDate::from_ymd_opt(2013, 3, 1).unwrap();
        let sel = Selection::from_dates("A", day, day);
        let hours: Vec<_> = apply_selection(&ds, &sel).iter().map(|r| r.datetime).collect();
        assert_eq!(hours, vec![at(2013, 3, 1, 0), at(2013, 3, 1, 23)]);
    }
}
