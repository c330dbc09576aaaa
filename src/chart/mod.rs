//! Chart layer: what to draw, independent of where it is drawn.
//!
//! ```text
//!   DerivedSeries ──▶ Chart ──┬──▶ render  (plotters → PNG)
//!                             └──▶ ui::plot (egui_plot window)
//! ```
pub mod render;

use palette::Srgb;

use crate::color::{SeriesStyle, BLACK};
use crate::data::derive::DerivedSeries;
use crate::error::AnalysisError;

/// Legend label of the single error-bar key.
pub const UNCERTAINTY_LABEL: &str = "Incerteza";

// ---------------------------------------------------------------------------
// Chart parts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub channel: String,
    pub style: SeriesStyle,
    /// `[x, y]` pairs in drawing order.
    pub points: Vec<[f64; 2]>,
    /// Absolute y uncertainty per point.
    pub errors: Vec<f64>,
}

/// Horizontal dashed guide, e.g. the unit ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLine {
    pub y: f64,
    pub label: String,
    pub color: Srgb<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBarStyle {
    pub color: Srgb<u8>,
    /// Line width in points.
    pub width: f64,
    /// Cap half-width in points.
    pub cap: f64,
}

impl Default for ErrorBarStyle {
    fn default() -> Self {
        Self {
            color: BLACK,
            width: 2.0,
            cap: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegendGlyph {
    Series(SeriesStyle),
    Line(Srgb<u8>),
    ErrorBar(Srgb<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub glyph: LegendGlyph,
}

// ---------------------------------------------------------------------------
// Chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed x tick positions; automatic when `None`.
    pub x_ticks: Option<Vec<f64>>,
    /// Figure size in inches, multiplied by the DPI for raster output.
    pub size_inches: (f64, f64),
    pub series: Vec<ChartSeries>,
    pub reference_lines: Vec<ReferenceLine>,
    pub error_bars: ErrorBarStyle,
    pub show_error_bars: bool,
    /// File name used when the chart is saved.
    pub file_name: String,
}

impl Chart {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            x_ticks: None,
            size_inches: (10.0, 5.0),
            series: Vec::new(),
            reference_lines: Vec::new(),
            error_bars: ErrorBarStyle::default(),
            show_error_bars: false,
            file_name: String::new(),
        }
    }

    /// Add one channel's computed values against `xs`.
    pub fn push_series(
        &mut self,
        label: impl Into<String>,
        style: SeriesStyle,
        xs: &[f64],
        derived: &DerivedSeries,
    ) -> Result<(), AnalysisError> {
        if xs.len() != derived.len() || derived.uncertainties.len() != derived.len() {
            return Err(AnalysisError::ShapeMismatch {
                channel: derived.channel.clone(),
                what: "plotted series".into(),
                expected: xs.len(),
                actual: derived.len(),
            });
        }
        self.series.push(ChartSeries {
            label: label.into(),
            channel: derived.channel.clone(),
            style,
            points: xs
                .iter()
                .zip(&derived.values)
                .map(|(&x, &y)| [x, y])
                .collect(),
            errors: derived.uncertainties.clone(),
        });
        Ok(())
    }

    /// One entry per series, then reference lines, then exactly one
    /// uncertainty key when error bars are drawn.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        let mut entries: Vec<LegendEntry> = self
            .series
            .iter()
            .map(|s| LegendEntry {
                label: s.label.clone(),
                glyph: LegendGlyph::Series(s.style),
            })
            .collect();
        entries.extend(self.reference_lines.iter().map(|r| LegendEntry {
            label: r.label.clone(),
            glyph: LegendGlyph::Line(r.color),
        }));
        if self.show_error_bars {
            entries.push(LegendEntry {
                label: UNCERTAINTY_LABEL.to_string(),
                glyph: LegendGlyph::ErrorBar(BLACK),
            });
        }
        entries
    }

    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let (w, h) = self.size_inches;
        let dpi = f64::from(dpi);
        ((w * dpi).round().max(1.0) as u32, (h * dpi).round().max(1.0) as u32)
    }

    /// Copy of the chart keeping only series whose flag is set. Missing flags
    /// count as visible.
    pub fn with_visible(&self, visible: &[bool]) -> Chart {
        let mut chart = self.clone();
        chart.series = self
            .series
            .iter()
            .enumerate()
            .filter(|(i, _)| visible.get(*i).copied().unwrap_or(true))
            .map(|(_, s)| s.clone())
            .collect();
        chart
    }

    /// Padded x extent of the data and ticks.
    pub fn x_range(&self) -> (f64, f64) {
        let xs = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p[0]))
            .chain(self.x_ticks.iter().flatten().copied());
        padded(xs)
    }

    /// Padded y extent of the data, error bars when shown, and reference
    /// lines.
    pub fn y_range(&self) -> (f64, f64) {
        let show = self.show_error_bars;
        let ys = self
            .series
            .iter()
            .flat_map(move |s| {
                s.points.iter().zip(&s.errors).flat_map(move |(p, e)| {
                    let e = if show { *e } else { 0.0 };
                    [p[1] - e, p[1] + e]
                })
            })
            .chain(self.reference_lines.iter().map(|r| r.y));
        padded(ys)
    }
}

fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return (0.0, 1.0);
    }
    let span = max - min;
    if span < f64::EPSILON * max.abs().max(1.0) {
        let half = (max.abs() * 0.1).max(1.0);
        return (min - half, max + half);
    }
    (min - span * 0.05, max + span * 0.05)
}
