use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::color::SeriesColors;
use crate::config::LaunchConfig;
use crate::data::filter::Selection;
use crate::data::model::Dataset;
use crate::data::summary::DashboardSummary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file is loaded). Never mutated after load.
    pub dataset: Option<Arc<Dataset>>,

    /// Station shown in every panel.
    pub station: Option<String>,

    /// Inclusive date range fed by the two date pickers.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Panels for the current selection (cached until the selection changes).
    pub summary: Option<DashboardSummary>,

    /// Line / bar colour per measure.
    pub colors: SeriesColors,

    /// Overrides applied to the first dataset loaded.
    pub launch: LaunchConfig,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            station: None,
            start_date: today(),
            end_date: today(),
            summary: None,
            colors: SeriesColors::default(),
            launch: LaunchConfig::default(),
            status_message: None,
            loading: false,
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl AppState {
    pub fn with_launch_config(launch: LaunchConfig) -> Self {
        Self {
            launch,
            ..Self::default()
        }
    }

    /// Ingest a newly loaded dataset and pick the initial selection.
    ///
    /// Launch overrides win over the defaults (first station, full date
    /// span) and are consumed by the first dataset.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let launch = std::mem::take(&mut self.launch);

        self.station = launch
            .station
            .filter(|s| {
                let known = dataset.stations().contains(s);
                if !known {
                    log::warn!("station '{s}' not found in dataset");
                }
                known
            })
            .or_else(|| dataset.stations().first().cloned());

        // An empty dataset has no span; the pickers then start on today.
        let (first, last) = dataset.date_bounds().unwrap_or_else(|| (today(), today()));
        self.start_date = launch.start.unwrap_or(first);
        self.end_date = launch.end.unwrap_or(last);

        self.dataset = Some(Arc::new(dataset));
        self.status_message = None;
        self.loading = false;
        self.refresh();
    }

    /// The current selection, if a station is chosen.
    pub fn selection(&self) -> Option<Selection> {
        let station = self.station.as_ref()?;
        Some(Selection::from_dates(
            station.clone(),
            self.start_date,
            self.end_date,
        ))
    }

    /// Recompute every panel from the dataset and the current selection.
    pub fn refresh(&mut self) {
        self.summary = match (&self.dataset, self.selection()) {
            (Some(ds), Some(sel)) => Some(DashboardSummary::compute(ds, &sel)),
            _ => None,
        };
    }

    pub fn set_station(&mut self, station: String) {
        if self.station.as_ref() != Some(&station) {
            self.station = Some(station);
            self.refresh();
        }
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.start_date = date;
        self.refresh();
    }

    pub fn set_end_date(&mut self, date: NaiveDate) {
        self.end_date = date;
        self.refresh();
    }

    /// Start after end selects nothing; the side panel warns about it.
    pub fn range_is_inverted(&self) -> bool {
        self.start_date > self.end_date
    }
}
