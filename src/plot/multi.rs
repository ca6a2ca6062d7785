use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::info;

use crate::plot::data::{LimitCurve, load_curve};
use crate::plot::style::PlotStyle;
use crate::plot::{PlotError, draw_err};

/// Every loaded record is overlaid, however few lifetime points survive the
/// positivity mask.
fn collect_curves(record_paths: &[PathBuf]) -> Result<Vec<LimitCurve>, PlotError> {
    record_paths.iter().map(|path| load_curve(path)).collect()
}

/// Multi-record overlay: upper panel of median expected limits per record,
/// lower dual-axis panel of signal yields (left) and constant background
/// predictions (right). Written as `{plots_dir}/{tag}.png`.
pub fn render_multi(
    tag: &str,
    record_paths: &[PathBuf],
    plots_dir: &Path,
    style: &PlotStyle,
) -> Result<PathBuf, PlotError> {
    let curves = collect_curves(record_paths)?;
    if curves.is_empty() {
        return Err(PlotError::Empty(tag.to_string()));
    }

    fs::create_dir_all(plots_dir)?;
    let out_path = plots_dir.join(format!("{tag}.png"));
    // The backend borrows its path for the drawing area's lifetime.
    let backend_path = out_path.clone();

    let x = log_range(curves.iter().flat_map(|c| c.ctaus_m.iter().copied()));
    let y_limit = log_range(curves.iter().flat_map(|c| c.exp_median.iter().copied()));
    let y_sig = log_range(
        curves
            .iter()
            .flat_map(|c| c.sig_ljdc.iter().chain(&c.sig_sjdc).copied()),
    );
    let y_bkg = log_range(
        curves
            .iter()
            .flat_map(|c| c.bkg_ljdc.iter().chain(&c.bkg_sjdc).copied()),
    );

    let root = BitMapBackend::new(&backend_path, style.multi_size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let (upper, lower) = root.split_vertically((style.multi_size.1 * 2 / 3) as i32);

    {
        let mut chart = ChartBuilder::on(&upper)
            .margin(15)
            .x_label_area_size(25)
            .y_label_area_size(75)
            .build_cartesian_2d((x.0..x.1).log_scale(), (y_limit.0..y_limit.1).log_scale())
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .y_desc(style.y_label_multi.clone())
            .draw()
            .map_err(draw_err)?;

        for (i, curve) in curves.iter().enumerate() {
            let color = ramp_color(i, curves.len());
            chart
                .draw_series(LineSeries::new(
                    points(&curve.ctaus_m, &curve.exp_median, y_limit.0),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(curve.tag.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 14))
            .border_style(&TRANSPARENT)
            .draw()
            .map_err(draw_err)?;
    }

    {
        let mut chart = ChartBuilder::on(&lower)
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(75)
            .right_y_label_area_size(75)
            .build_cartesian_2d((x.0..x.1).log_scale(), (y_sig.0..y_sig.1).log_scale())
            .map_err(draw_err)?
            .set_secondary_coord((x.0..x.1).log_scale(), (y_bkg.0..y_bkg.1).log_scale());

        chart
            .configure_mesh()
            .x_desc(style.x_label.clone())
            .y_desc("N Signal Events")
            .draw()
            .map_err(draw_err)?;
        chart
            .configure_secondary_axes()
            .y_desc("N Background Events")
            .draw()
            .map_err(draw_err)?;

        for (i, curve) in curves.iter().enumerate() {
            let color = ramp_color(i, curves.len());

            let series = chart
                .draw_series(DashedLineSeries::new(
                    points(&curve.ctaus_m, &curve.sig_ljdc, y_sig.0),
                    8,
                    4,
                    color.stroke_width(2).into(),
                ))
                .map_err(draw_err)?;
            if i == 0 {
                series.label("Signal LJDC").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(2))
                });
            }

            let series = chart
                .draw_series(DashedLineSeries::new(
                    points(&curve.ctaus_m, &curve.sig_sjdc, y_sig.0),
                    2,
                    4,
                    color.stroke_width(2).into(),
                ))
                .map_err(draw_err)?;
            if i == 0 {
                series.label("Signal SJDC").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(1))
                });
            }

            let series = chart
                .draw_secondary_series(LineSeries::new(
                    points(&curve.ctaus_m, &curve.bkg_ljdc, y_bkg.0),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?;
            if i == 0 {
                series.label("Background LJDC").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(3))
                });
            }

            let series = chart
                .draw_secondary_series(DashedLineSeries::new(
                    points(&curve.ctaus_m, &curve.bkg_sjdc, y_bkg.0),
                    5,
                    5,
                    color.stroke_width(2).into(),
                ))
                .map_err(draw_err)?;
            if i == 0 {
                series.label("Background SJDC").legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(2))
                });
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(("sans-serif", 13))
            .border_style(&TRANSPARENT)
            .draw()
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    info!(path = %out_path.display(), records = curves.len(), "overlay plot written");
    Ok(out_path)
}

/// Green-to-yellow hue ramp over the record index.
fn ramp_color(i: usize, n: usize) -> HSLColor {
    let frac = if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
    HSLColor(0.33 - 0.17 * frac, 0.65, 0.40)
}

fn points(x: &[f64], y: &[f64], y_floor: f64) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .map(|(&a, &b)| (a, b.max(y_floor)))
        .collect()
}

/// Range over the positive values only, padded for log axes.
fn log_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        if v > 0.0 {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return (1e-3, 1.0);
    }
    (min * 0.5, max * 2.0)
}
