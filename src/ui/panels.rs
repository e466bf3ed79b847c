use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel: station and date range.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    let stations = match &state.dataset {
        Some(ds) => ds.stations().to_vec(),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // ---- Station selector ----
    ui.strong("Select a station");
    let current = state.station.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("station")
        .selected_text(&current)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for station in &stations {
                if ui.selectable_label(current == *station, station).clicked() {
                    state.set_station(station.clone());
                }
            }
        });
    ui.add_space(8.0);

    // ---- Date range ----
    ui.strong("Start Date");
    let mut start = state.start_date;
    if ui
        .add(DatePickerButton::new(&mut start).id_salt("start_date"))
        .changed()
    {
        state.set_start_date(start);
    }
    ui.add_space(4.0);

    ui.strong("End Date");
    let mut end = state.end_date;
    if ui
        .add(DatePickerButton::new(&mut end).id_salt("end_date"))
        .changed()
    {
        state.set_end_date(end);
    }

    if state.range_is_inverted() {
        ui.add_space(4.0);
        ui.label(RichText::new("Start date is after end date.").color(Color32::YELLOW));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.summary.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export summary…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let selected = state.summary.as_ref().map_or(0, |s| s.matched);
            ui.label(format!("{} records loaded, {selected} selected", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air quality data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

fn export_dialog(state: &mut AppState) {
    let Some(summary) = &state.summary else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export summary")
        .add_filter("JSON", &["json"])
        .set_file_name(format!("{}_summary.json", summary.station))
        .save_file();

    if let Some(path) = file {
        match summary.export_json(&path) {
            Ok(()) => {
                log::info!("Exported summary to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
