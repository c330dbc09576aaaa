use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::chart::render::save_png;
use crate::color::to_color32;
use crate::data::export::export_chart;
use crate::state::{Status, ViewerState};

// ---------------------------------------------------------------------------
// Left side panel – series toggles
// ---------------------------------------------------------------------------

/// Render the left series panel.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Series");
    ui.separator();

    let Some(chart) = state.current() else {
        ui.label("No chart loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let entries: Vec<(String, Color32)> = chart
        .series
        .iter()
        .map(|s| (s.label.clone(), to_color32(s.style.rendered_color())))
        .collect();

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.set_all(true);
        }
        if ui.small_button("None").clicked() {
            state.set_all(false);
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, (label, color)) in entries.iter().enumerate() {
                let mut checked = state.current_visibility().get(i).copied().unwrap_or(true);
                if ui
                    .checkbox(&mut checked, RichText::new(label).color(*color))
                    .changed()
                {
                    state.toggle_series(i);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export PNG…").clicked() {
                export_png_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export CSV…").clicked() {
                export_csv_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let titles: Vec<String> = state.charts.iter().map(|c| c.title.clone()).collect();
        let current = titles.get(state.selected).cloned().unwrap_or_default();
        egui::ComboBox::from_id_salt("chart_select")
            .selected_text(current)
            .width(320.0)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, title) in titles.iter().enumerate() {
                    if ui.selectable_label(state.selected == i, title).clicked() {
                        state.select(i);
                    }
                }
            });

        ui.separator();

        let bars = state.current().is_some_and(|c| c.show_error_bars);
        if ui.selectable_label(bars, "Error bars").clicked() {
            state.toggle_error_bars();
        }

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// Export dialogs
// ---------------------------------------------------------------------------

pub fn export_png_dialog(state: &mut ViewerState) {
    let Some(chart) = state.visible_chart() else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export chart")
        .set_file_name(chart.file_name.as_str())
        .add_filter("PNG", &["png"])
        .save_file();

    if let Some(path) = file {
        state.status = Some(match save_png(&chart, &path, state.dpi) {
            Ok(()) => Status::Info(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Failed to export chart: {e}");
                Status::Error(format!("Error: {e}"))
            }
        });
    }
}

pub fn export_csv_dialog(state: &mut ViewerState) {
    let Some(chart) = state.visible_chart() else {
        return;
    };
    let Some(dir) = rfd::FileDialog::new()
        .set_title("Export series to folder")
        .pick_folder()
    else {
        return;
    };

    state.status = Some(match export_chart(&chart, &dir) {
        Ok(path) => Status::Info(format!("Exported {}", path.display())),
        Err(e) => {
            log::error!("Failed to export series: {e}");
            Status::Error(format!("Error: {e}"))
        }
    });
}
