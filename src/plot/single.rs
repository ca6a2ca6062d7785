use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::FontStyle;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::info;

use crate::plot::data::load_curve;
use crate::plot::style::PlotStyle;
use crate::plot::{PlotError, draw_err};

/// Log-log Brazil-band plot of the median expected limit with 1σ/2σ bands,
/// written as `{plots_dir}/{record_tag}.svg`.
pub fn render_single(
    record_path: &Path,
    plots_dir: &Path,
    style: &PlotStyle,
) -> Result<PathBuf, PlotError> {
    let curve = load_curve(record_path)?;
    if curve.ctaus_m.is_empty() {
        return Err(PlotError::Empty(curve.tag));
    }
    fs::create_dir_all(plots_dir)?;
    let out_path = plots_dir.join(format!("{}.svg", curve.tag));
    // The backend borrows its path for the drawing area's lifetime.
    let backend_path = out_path.clone();

    let (x_min, x_max) = x_range(&curve.ctaus_m);
    let (y_min, y_max) = style.y_range_single;
    let clamp = move |v: f64| v.clamp(y_min, y_max);

    let root = SVGBackend::new(&backend_path, style.single_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    draw_header(&root, style)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .margin_top(45)
        .x_label_area_size(45)
        .y_label_area_size(65)
        .build_cartesian_2d((x_min..x_max).log_scale(), (y_min..y_max).log_scale())
        .map_err(draw_err)?;

    chart
        .configure_mesh()
        .x_desc(style.x_label.clone())
        .y_desc(style.y_label_single.clone())
        .draw()
        .map_err(draw_err)?;

    // 2σ band below the 1σ band, median curve on top.
    let band_2s = band_polygon(&curve.ctaus_m, &curve.exp_2s_low, &curve.exp_2s_high, clamp);
    let color_2s = style.band_2sigma;
    chart
        .draw_series(std::iter::once(Polygon::new(band_2s, color_2s.mix(0.5))))
        .map_err(draw_err)?
        .label("±2σ")
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 14, y + 5)], color_2s.mix(0.5).filled())
        });

    let band_1s = band_polygon(&curve.ctaus_m, &curve.exp_1s_low, &curve.exp_1s_high, clamp);
    let color_1s = style.band_1sigma;
    chart
        .draw_series(std::iter::once(Polygon::new(band_1s, color_1s.mix(0.8))))
        .map_err(draw_err)?
        .label("±1σ")
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 14, y + 5)], color_1s.mix(0.8).filled())
        });

    let median: Vec<(f64, f64)> = curve
        .ctaus_m
        .iter()
        .zip(&curve.exp_median)
        .map(|(&x, &y)| (x, clamp(y)))
        .collect();
    chart
        .draw_series(DashedLineSeries::new(median, 6, 3, BLACK.stroke_width(2).into()))
        .map_err(draw_err)?
        .label("Expected")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 15))
        .border_style(&TRANSPARENT)
        .draw()
        .map_err(draw_err)?;

    root.present().map_err(draw_err)?;
    info!(path = %out_path.display(), "limit plot written");
    Ok(out_path)
}

fn draw_header<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    style: &PlotStyle,
) -> Result<(), PlotError> {
    let bold = ("sans-serif", 24).into_font().style(FontStyle::Bold);
    root.draw(&Text::new(style.experiment.clone(), (25, 12), bold))
        .map_err(draw_err)?;
    let italic = ("sans-serif", 19).into_font().style(FontStyle::Italic);
    root.draw(&Text::new(style.annotation.clone(), (95, 16), italic))
        .map_err(draw_err)?;
    let lumi_style =
        TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Right, VPos::Top));
    let (width, _) = root.dim_in_pixel();
    root.draw(&Text::new(
        style.lumi_text.clone(),
        (width as i32 - 12, 16),
        &lumi_style,
    ))
    .map_err(draw_err)?;
    Ok(())
}

/// Band outline: along the upper edge, then back along the lower edge.
fn band_polygon(
    x: &[f64],
    low: &[f64],
    high: &[f64],
    clamp: impl Fn(f64) -> f64,
) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(x.len() * 2);
    for (&xi, &hi) in x.iter().zip(high) {
        points.push((xi, clamp(hi)));
    }
    for (&xi, &lo) in x.iter().zip(low).rev() {
        points.push((xi, clamp(lo)));
    }
    points
}

fn x_range(x: &[f64]) -> (f64, f64) {
    let min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        (min * 0.5, max * 2.0)
    } else {
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_polygon_walks_high_then_low_reversed() {
        let pts = band_polygon(&[1.0, 2.0], &[0.1, 0.2], &[0.4, 0.5], |v| v);
        assert_eq!(pts, vec![(1.0, 0.4), (2.0, 0.5), (2.0, 0.2), (1.0, 0.1)]);
    }

    #[test]
    fn test_band_polygon_clamps_sentinels() {
        let pts = band_polygon(&[1.0], &[-1.0], &[0.4], |v| v.clamp(5e-4, 1.0));
        assert_eq!(pts[1].1, 5e-4);
    }

    #[test]
    fn test_x_range_degenerate_point_is_padded() {
        assert_eq!(x_range(&[2.0]), (1.0, 4.0));
        assert_eq!(x_range(&[1.0, 8.0]), (1.0, 8.0));
    }
}
