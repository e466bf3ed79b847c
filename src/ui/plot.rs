use std::ops::RangeInclusive;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints};

use crate::color::SeriesColors;
use crate::data::aggregate::{format_mean, AverageSummary, MonthlyPoint, YearMonth};
use crate::data::model::Measure;
use crate::data::summary::{CO_TREND_FIELDS, GAS_TREND_FIELDS};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Dashboard page (central panel)
// ---------------------------------------------------------------------------

/// Render the dashboard page in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let summary = match (&state.dataset, &state.summary) {
        (_, Some(s)) => s,
        (Some(ds), None) if ds.is_empty() => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Dataset contains no records");
            });
            return;
        }
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a dataset to view station statistics  (File → Open…)");
            });
            return;
        }
    };
    let station = &summary.station;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new("Air Quality Dashboard").size(26.0));
            ui.label(
                "Visualize Average Climate Data, Average PM2.5 and PM10, \
                 and Monthly Trend for SO2, NO2, O3, and CO",
            );
            ui.add_space(12.0);

            if summary.climate.is_undefined() && summary.particulates.is_undefined() {
                ui.label(
                    RichText::new("No data for this station and date range.")
                        .color(egui::Color32::YELLOW),
                );
                ui.add_space(8.0);
            }

            ui.heading(format!("Average Climate Data for {station}"));
            climate_table(ui, &summary.climate);
            ui.add_space(12.0);

            ui.heading(format!("Average PM2.5 and PM10 for {station}"));
            particulate_chart(ui, &summary.particulates, &state.colors);
            ui.add_space(12.0);

            ui.heading(format!("Monthly Trend for SO2, NO2, and O3 in {station}"));
            trend_chart(ui, "gas_trend", &summary.gas_trend, &GAS_TREND_FIELDS, &state.colors);
            ui.add_space(12.0);

            ui.heading(format!("Monthly Trend for CO in {station}"));
            trend_chart(ui, "co_trend", &summary.co_trend, &CO_TREND_FIELDS, &state.colors);
        });
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn climate_table(ui: &mut Ui, averages: &AverageSummary) {
    egui::Grid::new("climate_table")
        .striped(true)
        .num_columns(3)
        .min_col_width(90.0)
        .show(ui, |ui: &mut Ui| {
            ui.strong("");
            ui.strong("Average");
            ui.strong("Unit");
            ui.end_row();

            for entry in &averages.entries {
                ui.label(entry.measure.column())
                    .on_hover_text(entry.measure.label());
                ui.label(format_mean(entry.mean));
                ui.label(entry.measure.unit());
                ui.end_row();
            }
        });
}

fn particulate_chart(ui: &mut Ui, averages: &AverageSummary, colors: &SeriesColors) {
    // Undefined averages get no bar.
    let bars: Vec<Bar> = averages
        .entries
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            let mean = e.mean?;
            Some(
                Bar::new(i as f64, mean)
                    .name(e.measure.column())
                    .fill(colors.color_for(e.measure))
                    .width(0.6),
            )
        })
        .collect();

    let labels: Vec<&'static str> = averages.entries.iter().map(|e| e.measure.column()).collect();

    Plot::new("particulate_chart")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label("Average (µg/m³)")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        })
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Average"));
        });
}

fn trend_chart(
    ui: &mut Ui,
    id: &str,
    series: &[MonthlyPoint],
    fields: &[Measure],
    colors: &SeriesColors,
) {
    if series.is_empty() {
        ui.label("No records for this selection.");
        return;
    }

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Month")
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| month_label(mark.value))
        .label_formatter(|name: &str, value: &PlotPoint| {
            let month = YearMonth::from_ordinal(value.x.round() as i64);
            if name.is_empty() {
                month.to_string()
            } else {
                format!("{name}\n{month}: {:.2}", value.y)
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &field in fields {
                let points: PlotPoints = trend_points(series, field).into();
                plot_ui.line(
                    Line::new(points)
                        .name(field.column())
                        .color(colors.color_for(field))
                        .width(1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Axis helpers
// ---------------------------------------------------------------------------

/// Points of one field, x = month ordinal. Undefined months are left out.
pub fn trend_points(series: &[MonthlyPoint], field: Measure) -> Vec<[f64; 2]> {
    series
        .iter()
        .filter_map(|p| p.get(field).map(|v| [p.month.ordinal() as f64, v]))
        .collect()
}

/// `YYYY-MM` on whole month ticks, blank between them.
pub fn month_label(x: f64) -> String {
    if (x - x.round()).abs() > 1e-6 {
        return String::new();
    }
    YearMonth::from_ordinal(x.round() as i64).to_string()
}

fn category_label(labels: &[&str], x: f64) -> String {
    if (x - x.round()).abs() > 1e-6 || x < 0.0 {
        return String::new();
    }
    labels
        .get(x.round() as usize)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::FieldAverage;

    fn point(year: i32, month: u32, so2: Option<f64>) -> MonthlyPoint {
        MonthlyPoint {
            month: YearMonth { year, month },
            values: vec![FieldAverage {
                measure: Measure::So2,
                mean: so2,
            }],
        }
    }

    #[test]
    fn undefined_months_are_dropped_from_lines() {
        let series = vec![
            point(2013, 12, Some(30.0)),
            point(2014, 1, None),
            point(2014, 2, Some(12.5)),
        ];
        let pts = trend_points(&series, Measure::So2);
        assert_eq!(pts.len(), 2);
        assert_eq!(pts[1][1], 12.5);
        assert_eq!(pts[1][0] - pts[0][0], 2.0);
        assert!(trend_points(&series, Measure::No2).is_empty());
    }

    #[test]
    fn axis_labels() {
        let ym = YearMonth { year: 2015, month: 7 };
        assert_eq!(month_label(ym.ordinal() as f64), "2015-07");
        assert_eq!(month_label(ym.ordinal() as f64 + 0.5), "");
        assert_eq!(category_label(&["PM2.5", "PM10"], 1.0), "PM10");
        assert_eq!(category_label(&["PM2.5", "PM10"], 2.0), "");
        assert_eq!(category_label(&["PM2.5", "PM10"], -1.0), "");
    }
}
