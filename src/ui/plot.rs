use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, PlotUi, Points};

use crate::chart::{LegendEntry, LegendGlyph};
use crate::color::{to_color32, Marker};
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Chart plot (central panel)
// ---------------------------------------------------------------------------

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Circle => MarkerShape::Circle,
        Marker::Square => MarkerShape::Square,
        Marker::TriangleUp => MarkerShape::Up,
        Marker::Diamond => MarkerShape::Diamond,
        Marker::TriangleDown => MarkerShape::Down,
    }
}

/// Colour of a legend key.
fn legend_color(glyph: &LegendGlyph) -> Color32 {
    match glyph {
        LegendGlyph::Series(style) => to_color32(style.rendered_color()),
        LegendGlyph::Line(color) | LegendGlyph::ErrorBar(color) => to_color32(*color),
    }
}

/// One empty, named item per legend entry. Drawn geometry stays unnamed so
/// the legend shows exactly these keys.
fn legend_key(plot_ui: &mut PlotUi, entry: &LegendEntry) {
    let color = legend_color(&entry.glyph);
    let empty = || PlotPoints::new(Vec::new());
    match &entry.glyph {
        LegendGlyph::Series(style) => plot_ui.points(
            Points::new(empty())
                .name(&entry.label)
                .color(color)
                .shape(marker_shape(style.marker))
                .radius(4.0)
                .filled(true),
        ),
        LegendGlyph::Line(_) => plot_ui.line(
            Line::new(empty())
                .name(&entry.label)
                .color(color)
                .style(LineStyle::dashed_loose()),
        ),
        LegendGlyph::ErrorBar(_) => {
            plot_ui.line(Line::new(empty()).name(&entry.label).color(color).width(1.0))
        }
    }
}

/// Render the selected chart in the central panel.
pub fn chart_plot(ui: &mut Ui, state: &ViewerState) {
    let Some(chart) = state.visible_chart() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No chart to show");
        });
        return;
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(&chart.title);
    });

    let error_color = to_color32(chart.error_bars.color);
    let error_width = chart.error_bars.width as f32;
    let legend = chart.legend_entries();

    Plot::new(("chart_plot", state.selected))
        .legend(Legend::default())
        .x_axis_label(chart.x_label.clone())
        .y_axis_label(chart.y_label.clone())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &chart.series {
                let color = to_color32(series.style.rendered_color());

                let line: PlotPoints = series.points.iter().copied().collect();
                plot_ui.line(Line::new(line).color(color).width(1.5));

                let markers: PlotPoints = series.points.iter().copied().collect();
                plot_ui.points(
                    Points::new(markers)
                        .color(color)
                        .shape(marker_shape(series.style.marker))
                        .radius(4.0)
                        .filled(true),
                );

                if !chart.show_error_bars {
                    continue;
                }
                let (x_min, x_max) = chart.x_range();
                let cap = (x_max - x_min) * 0.005;
                for (p, e) in series.points.iter().zip(&series.errors) {
                    let [x, y] = *p;
                    for segment in [
                        vec![[x, y - e], [x, y + e]],
                        vec![[x - cap, y - e], [x + cap, y - e]],
                        vec![[x - cap, y + e], [x + cap, y + e]],
                    ] {
                        plot_ui.line(Line::new(segment).color(error_color).width(error_width));
                    }
                }
            }

            for reference in &chart.reference_lines {
                plot_ui.hline(
                    HLine::new(reference.y)
                        .color(to_color32(reference.color))
                        .style(LineStyle::dashed_loose()),
                );
            }

            for entry in &legend {
                legend_key(plot_ui, entry);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, ErrorBarStyle, UNCERTAINTY_LABEL};
    use crate::color::GRAY;

    #[test]
    fn uncertainty_key_is_black_even_with_gray_bars() {
        let mut chart = Chart::new("T", "x", "y");
        chart.show_error_bars = true;
        chart.error_bars = ErrorBarStyle {
            color: GRAY,
            width: 1.0,
            cap: 5.0,
        };
        let keys: Vec<Color32> = chart
            .legend_entries()
            .iter()
            .filter(|e| e.label == UNCERTAINTY_LABEL)
            .map(|e| legend_color(&e.glyph))
            .collect();
        assert_eq!(keys, vec![Color32::BLACK]);
    }
}
