use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use palette::Srgb;
use plotters::prelude::*;

use super::{Chart, ChartSeries, LegendGlyph};
use crate::color::Marker;
use crate::error::AnalysisError;

/// Point sizes are given for 100 DPI and scaled from there.
const BASE_DPI: f64 = 100.0;

/// Largest RGB buffer a single chart may allocate.
const MAX_BUFFER_BYTES: usize = 1 << 30;

fn rgb(color: Srgb<u8>) -> RGBColor {
    RGBColor(color.red, color.green, color.blue)
}

/// Bytes of an RGB buffer of `width` x `height` pixels.
fn buffer_len(width: u32, height: u32) -> Result<usize, AnalysisError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .filter(|&n| n <= MAX_BUFFER_BYTES)
        .ok_or_else(|| {
            AnalysisError::Plot(format!("image of {width}x{height} pixels is too large"))
        })
}

/// Render `chart` as PNG bytes at `dpi`.
pub fn render_png(chart: &Chart, dpi: u32) -> Result<Vec<u8>, AnalysisError> {
    let (width, height) = chart.pixel_size(dpi);
    let scale = f64::from(dpi) / BASE_DPI;
    let px = |points: f64| (points * scale).round().max(1.0) as u32;

    let mut buffer = vec![0u8; buffer_len(width, height)?];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_min, x_max) = chart.x_range();
        let (y_min, y_max) = chart.y_range();

        let mut ctx = ChartBuilder::on(&root)
            .margin(px(12.0))
            .caption(&chart.title, ("sans-serif", 16.0 * scale))
            .set_label_area_size(LabelAreaPosition::Left, px(70.0))
            .set_label_area_size(LabelAreaPosition::Bottom, px(50.0))
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let x_labels = chart.x_ticks.as_ref().map_or(10, |t| t.len().max(2));
        ctx.configure_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .x_labels(x_labels)
            .x_label_formatter(&|v| format!("{v:.1}"))
            .label_style(("sans-serif", 11.0 * scale))
            .axis_desc_style(("sans-serif", 13.0 * scale))
            .bold_line_style(RGBColor(200, 200, 200).stroke_width(px(0.5)))
            .light_line_style(RGBColor(235, 235, 235).stroke_width(px(0.5)))
            .draw()?;

        for series in &chart.series {
            let color = rgb(series.style.rendered_color());
            let line = color.stroke_width(px(1.5));
            let points: Vec<(f64, f64)> = series.points.iter().map(|p| (p[0], p[1])).collect();

            ctx.draw_series(LineSeries::new(points.iter().copied(), line))?;

            if chart.show_error_bars {
                draw_error_bars(&mut ctx, chart, series, scale)?;
            }
            draw_markers(&mut ctx, series.style.marker, &points, color, px(4.0) as i32)?;
        }

        for reference in &chart.reference_lines {
            let style = rgb(reference.color).stroke_width(px(1.0));
            ctx.draw_series(dashed(reference.y, x_min, x_max, style))?;
        }

        // Legend keys are empty series so every entry is drawn exactly once.
        for entry in chart.legend_entries() {
            let (style, vertical) = match entry.glyph {
                LegendGlyph::Series(s) => (rgb(s.rendered_color()).stroke_width(px(1.5)), false),
                LegendGlyph::Line(c) => (rgb(c).stroke_width(px(1.0)), false),
                LegendGlyph::ErrorBar(c) => (rgb(c).stroke_width(px(1.0)), true),
            };
            let half = px(6.0) as i32;
            ctx.draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(entry.label)
                .legend(move |(x, y)| {
                    if vertical {
                        PathElement::new(vec![(x + 10, y - half), (x + 10, y + half)], style)
                    } else {
                        PathElement::new(vec![(x, y), (x + 20, y)], style)
                    }
                });
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 11.0 * scale))
            .border_style(RGBColor(180, 180, 180))
            .background_style(WHITE.mix(0.85))
            .draw()?;

        root.present()?;
    }
    encode_png(&buffer, width, height)
}

/// Render and write `chart` to `path`.
pub fn save_png(chart: &Chart, path: &Path, dpi: u32) -> Result<(), AnalysisError> {
    let bytes = render_png(chart, dpi)?;
    std::fs::write(path, bytes)
        .map_err(|e| AnalysisError::Plot(format!("writing {}: {e}", path.display())))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

type Ctx<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>;

fn draw_error_bars(
    ctx: &mut Ctx<'_, '_>,
    chart: &Chart,
    series: &ChartSeries,
    scale: f64,
) -> Result<(), AnalysisError> {
    let style = &chart.error_bars;
    let stroke = rgb(style.color).stroke_width((style.width * scale).round().max(1.0) as u32);
    let cap = (2.0 * style.cap * scale).round().max(1.0) as u32;
    ctx.draw_series(series.points.iter().zip(&series.errors).map(|(p, e)| {
        ErrorBar::new_vertical(p[0], p[1] - e, p[1], p[1] + e, stroke, cap)
    }))?;
    Ok(())
}

fn draw_markers(
    ctx: &mut Ctx<'_, '_>,
    marker: Marker,
    points: &[(f64, f64)],
    color: RGBColor,
    r: i32,
) -> Result<(), AnalysisError> {
    let fill = color.filled();
    let pts = points.iter().copied();
    match marker {
        Marker::Circle => {
            ctx.draw_series(pts.map(|p| Circle::new(p, r, fill)))?;
        }
        Marker::Square => {
            ctx.draw_series(pts.map(|p| EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], fill)))?;
        }
        Marker::TriangleUp => {
            ctx.draw_series(pts.map(|p| {
                EmptyElement::at(p) + Polygon::new(vec![(0, -r), (r, r), (-r, r)], fill)
            }))?;
        }
        Marker::TriangleDown => {
            ctx.draw_series(pts.map(|p| {
                EmptyElement::at(p) + Polygon::new(vec![(0, r), (r, -r), (-r, -r)], fill)
            }))?;
        }
        Marker::Diamond => {
            ctx.draw_series(pts.map(|p| {
                EmptyElement::at(p) + Polygon::new(vec![(0, -r), (r, 0), (0, r), (-r, 0)], fill)
            }))?;
        }
    }
    Ok(())
}

/// Horizontal line at `y` split into dashes across the x extent.
fn dashed(y: f64, x_min: f64, x_max: f64, style: ShapeStyle) -> Vec<PathElement<(f64, f64)>> {
    const DASHES: usize = 60;
    let step = (x_max - x_min) / DASHES as f64;
    (0..DASHES)
        .map(|i| {
            let x0 = x_min + step * i as f64;
            PathElement::new(vec![(x0, y), (x0 + step * 0.6, y)], style)
        })
        .collect()
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, AnalysisError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| AnalysisError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ReferenceLine;
    use crate::color::{StyleCycle, BLACK};
    use crate::data::derive::DerivedSeries;

    fn chart() -> Chart {
        let mut chart = Chart::new("Transmissão", "Tensão [V]", "Perda em decibéis");
        chart.show_error_bars = true;
        chart.x_ticks = Some(vec![0.0, 0.5, 1.0]);
        let cycle = StyleCycle::attenuators();
        for (i, id) in ["AT1", "AT2", "AT3", "AT4", "AT5"].iter().enumerate() {
            let derived = DerivedSeries {
                channel: id.to_string(),
                values: vec![0.0, -1.0 - i as f64, -2.5 - i as f64],
                uncertainties: vec![0.1, 0.2, 0.3],
            };
            chart
                .push_series(format!("Atenuador {id}"), cycle.style_for(i), &[0.0, 0.5, 1.0], &derived)
                .unwrap();
        }
        chart.reference_lines.push(ReferenceLine {
            y: -1.0,
            label: "ref".into(),
            color: BLACK,
        });
        chart
    }

    #[test]
    fn renders_png_of_requested_size() {
        let chart = chart();
        let bytes = render_png(&chart, 100).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), chart.pixel_size(100));
    }

    #[test]
    fn renders_empty_chart() {
        let mut chart = Chart::new("Vazio", "x", "y");
        chart.show_error_bars = true;
        assert!(render_png(&chart, 50).is_ok());
    }

    #[test]
    fn save_png_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transmissao_atenuadores_AT1.png");
        save_png(&chart(), &path, 72).unwrap();
        let written = image::open(&path).unwrap();
        assert_eq!(written.width(), 720);
    }

    #[test]
    fn oversized_image_is_an_error_not_a_panic() {
        let err = render_png(&chart(), 20_000).unwrap_err();
        assert!(matches!(err, AnalysisError::Plot(_)));
        assert!(buffer_len(u32::MAX, u32::MAX).is_err());
        assert_eq!(buffer_len(10, 5).unwrap(), 150);
    }
}
