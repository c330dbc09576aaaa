use eframe::egui;

use crate::chart::Chart;
use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct OptobenchApp {
    pub state: ViewerState,
}

impl OptobenchApp {
    pub fn new(charts: Vec<Chart>, dpi: u32) -> Self {
        Self {
            state: ViewerState::new(charts, dpi),
        }
    }
}

impl eframe::App for OptobenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: series ----
        egui::SidePanel::left("series_panel")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::chart_plot(ui, &self.state);
        });
    }
}

/// Open the viewer window and block until it is closed.
pub fn show(charts: Vec<Chart>, dpi: u32) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Optobench – Chart Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(OptobenchApp::new(charts, dpi)))),
    )
}
