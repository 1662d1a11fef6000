use std::ops::RangeInclusive;

use chrono::{Duration, NaiveDate};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::analysis::adapter::SeasonalComponents;
use crate::state::AppState;

const SERIES_COLOR: Color32 = Color32::from_rgb(99, 110, 250);
const CHART_HEIGHT: f32 = 320.0;
const COMPONENT_HEIGHT: f32 = 180.0;

// ---------------------------------------------------------------------------
// Date <-> plot axis
// ---------------------------------------------------------------------------

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Plot x coordinate of a date: days since 1970-01-01.
pub fn date_to_x(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

/// Inverse of [`date_to_x`], rounded to the nearest day.
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    epoch().checked_add_signed(Duration::try_days(x.round() as i64)?)
}

fn format_x_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    x_to_date(mark.value)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn format_hover(name: &str, point: &PlotPoint) -> String {
    let date = x_to_date(point.x)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    if name.is_empty() {
        format!("{date}\n{:.2}", point.y)
    } else {
        format!("{name}\n{date}\n{:.2}", point.y)
    }
}

// ---------------------------------------------------------------------------
// Time series (filtered records)
// ---------------------------------------------------------------------------

/// Render the filtered series, or a note when the selection is empty.
pub fn time_series_plot(ui: &mut Ui, state: &AppState) {
    let Some(sel) = &state.selection else {
        ui.label("The dataset has no records.");
        return;
    };

    ui.heading(format!("Time Series: {} in {}", sel.meat_type, sel.country));
    if state.series.is_empty() {
        ui.label("No data available for the selected filters.");
        return;
    }

    ui.label(RichText::new(format!("Time Series of {} in {}", sel.meat_type, sel.country)).strong());

    let records = &state.series.records;
    let line: PlotPoints = records
        .iter()
        .map(|r| [date_to_x(r.date), r.value])
        .collect();

    Plot::new("time_series")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(format_x_axis)
        .label_formatter(format_hover)
        .allow_scroll(false)
        .x_axis_label("Year")
        .y_axis_label("Meat Production (tonnes)")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(line).name("Value").color(SERIES_COLOR).width(2.0));

            // One marker layer per category so mixed categories stay apart.
            for category in &sel.value_categories {
                let points: Vec<[f64; 2]> = records
                    .iter()
                    .filter(|r| &r.value_category == category)
                    .map(|r| [date_to_x(r.date), r.value])
                    .collect();
                if points.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(points)
                        .name(category)
                        .color(state.color_map.color_for(category))
                        .radius(3.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Seasonal decomposition (four component charts)
// ---------------------------------------------------------------------------

/// Render the decomposition section: four charts, or the reason there are none.
pub fn decomposition_plots(ui: &mut Ui, state: &AppState) {
    ui.heading("Seasonal Decomposition");

    if let Some(msg) = state.decomposition.message() {
        ui.label(msg);
        return;
    }
    let Some(c) = state.decomposition.components() else {
        return;
    };

    let observed: Vec<Option<f64>> = c.observed.iter().copied().map(Some).collect();
    let seasonal: Vec<Option<f64>> = c.seasonal.iter().copied().map(Some).collect();

    component_plot(ui, "Observed Trend", "observed", c, &observed);
    component_plot(ui, "Trend", "trend", c, &c.trend);
    component_plot(ui, "Seasonality", "seasonal", c, &seasonal);
    component_plot(ui, "Residuals", "residual", c, &c.residual);
}

/// One component line; undefined edge values are left out.
fn component_plot(
    ui: &mut Ui,
    caption: &str,
    id: &str,
    components: &SeasonalComponents,
    values: &[Option<f64>],
) {
    ui.label(caption);
    let points: PlotPoints = components
        .dates
        .iter()
        .zip(values)
        .filter_map(|(d, v)| v.map(|v| [date_to_x(*d), v]))
        .collect();

    Plot::new(id)
        .height(COMPONENT_HEIGHT)
        .x_axis_formatter(format_x_axis)
        .label_formatter(format_hover)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(SERIES_COLOR).width(1.5));
        });
    ui.add_space(6.0);
}

// ---------------------------------------------------------------------------
// Filtered records table
// ---------------------------------------------------------------------------

const RECORDS_TABLE_ID: &str = "filtered_records";

pub fn records_table(ui: &mut Ui, state: &AppState) {
    let records = &state.series.records;
    // The label carries the count; the fixed id keeps the open state across filter changes.
    egui::CollapsingHeader::new(format!("Filtered records ({})", records.len()))
        .id_salt(RECORDS_TABLE_ID)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::auto().at_least(90.0))
                .column(Column::auto().at_least(120.0))
                .column(Column::remainder())
                .max_scroll_height(240.0)
                .header(20.0, |mut header| {
                    header.col(|ui| {
                        ui.strong("Date");
                    });
                    header.col(|ui| {
                        ui.strong("Value Category");
                    });
                    header.col(|ui| {
                        ui.strong("Value (tonnes)");
                    });
                })
                .body(|body| {
                    body.rows(18.0, records.len(), |mut row| {
                        let rec = &records[row.index()];
                        row.col(|ui| {
                            ui.label(rec.date.to_string());
                        });
                        row.col(|ui| {
                            ui.colored_label(
                                state.color_map.color_for(&rec.value_category),
                                &rec.value_category,
                            );
                        });
                        row.col(|ui| {
                            ui.label(format!("{:.2}", rec.value));
                        });
                    });
                });
        });
}
