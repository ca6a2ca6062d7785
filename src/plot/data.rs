use std::path::Path;

use crate::pipeline::stage4_combine::EXPECTED_PERCENT;
use crate::pipeline::stage5_record::{self, ResultRecord};
use crate::plot::PlotError;

/// Lifetimes are stored in mm and plotted in m.
pub const MM_TO_M: f64 = 1.0e-3;

/// One record's plottable series, with the positivity mask already applied
/// to every per-lifetime field and lifetimes converted to meters.
#[derive(Debug, Clone)]
pub struct LimitCurve {
    pub tag: String,
    pub ctaus_m: Vec<f64>,
    pub exp_median: Vec<f64>,
    pub exp_1s_low: Vec<f64>,
    pub exp_1s_high: Vec<f64>,
    pub exp_2s_low: Vec<f64>,
    pub exp_2s_high: Vec<f64>,
    pub sig_ljdc: Vec<f64>,
    pub sig_sjdc: Vec<f64>,
    /// Background predictions are scalars in the record; broadcast to one
    /// value per surviving lifetime point for drawing.
    pub bkg_ljdc: Vec<f64>,
    pub bkg_sjdc: Vec<f64>,
}

pub fn load_curve(path: &Path) -> Result<LimitCurve, PlotError> {
    let record = stage5_record::load(path)?;
    let tag = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    curve_from_record(tag, &record)
}

/// Failed extraction points carry `-1` sentinels; the median-expected value
/// drives a single mask applied uniformly so all series stay aligned.
pub fn curve_from_record(tag: String, record: &ResultRecord) -> Result<LimitCurve, PlotError> {
    let median = record.expected("50.0")?;
    let mask: Vec<bool> = median.iter().map(|&v| v > 0.0).collect();

    let ctaus_m: Vec<f64> = masked(&record.ctaus, &mask)
        .into_iter()
        .map(|c| c * MM_TO_M)
        .collect();
    let n_kept = ctaus_m.len();

    let curve = LimitCurve {
        tag,
        ctaus_m,
        exp_median: masked(median, &mask),
        exp_1s_low: masked(record.expected(EXPECTED_PERCENT[1])?, &mask),
        exp_1s_high: masked(record.expected(EXPECTED_PERCENT[3])?, &mask),
        exp_2s_low: masked(record.expected(EXPECTED_PERCENT[0])?, &mask),
        exp_2s_high: masked(record.expected(EXPECTED_PERCENT[4])?, &mask),
        sig_ljdc: masked(&record.nevents_sig_ljdc, &mask),
        sig_sjdc: masked(&record.nevents_sig_sjdc, &mask),
        bkg_ljdc: vec![record.nevents_bkg_ljdc; n_kept],
        bkg_sjdc: vec![record.nevents_bkg_sjdc; n_kept],
    };
    Ok(curve)
}

fn masked(values: &[f64], mask: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect()
}
