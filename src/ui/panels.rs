use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(sel) = state.selection.clone() else {
        ui.label("No data loaded.");
        return;
    };
    let dataset = Arc::clone(&state.dataset);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Country ----
            ui.strong("Select Country");
            egui::ComboBox::from_id_salt("country")
                .selected_text(&sel.country)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for country in &dataset.countries {
                        if ui.selectable_label(sel.country == *country, country).clicked() {
                            state.set_country(country);
                        }
                    }
                });
            ui.add_space(8.0);

            // ---- Meat type ----
            ui.strong("Select Meat Type");
            egui::ComboBox::from_id_salt("meat_type")
                .selected_text(&sel.meat_type)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for meat in &dataset.meat_types {
                        if ui.selectable_label(sel.meat_type == *meat, meat).clicked() {
                            state.set_meat_type(meat);
                        }
                    }
                });
            ui.add_space(8.0);

            // ---- Value categories (multi-select) ----
            let n_selected = sel.value_categories.len();
            let n_total = dataset.value_categories.len();
            ui.horizontal(|ui: &mut Ui| {
                ui.strong(format!("Select Value Category  ({n_selected}/{n_total})"));
                if ui.small_button("All").clicked() {
                    state.select_all_categories();
                }
            });

            for category in &dataset.value_categories {
                let mut checked = sel.value_categories.contains(category);
                let text = RichText::new(category).color(state.color_map.color_for(category));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_category(category);
                }
            }
        });
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
        });

        ui.separator();

        let file_name = state
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui.label(format!(
            "{file_name}: {} records loaded, {} selected",
            state.dataset.len(),
            state.series.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open meat production data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
