use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

pub mod stage1_background;
pub mod stage2_yields;
pub mod stage3_datacard;
pub mod stage4_combine;
pub mod stage5_record;

use crate::input::{InputError, load_sample};
use crate::model::background::BackgroundError;
use crate::model::cuts::CutConfig;
use stage3_datacard::{DatacardError, DatacardValues};
use stage4_combine::ReportParser;
use stage5_record::{RecordAccumulator, RecordError};

/// Temporary signal scale factor applied to datacard yields and undone on
/// the extracted limits, keeping the fit numerically tame.
pub const SIGNAL_SCALE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    Datacard(#[from] DatacardError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("invalid report pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub signal_path: PathBuf,
    pub data_path: PathBuf,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub cuts: CutConfig,
    /// Generated sample lifetime in mm.
    pub ctau_sample: f64,
    /// Target lifetimes in mm.
    pub lifetimes: Vec<f64>,
    pub lumi_sf: f64,
    /// Limit-setting executable name or path.
    pub combine_program: String,
}

/// Stage one end to end: background prediction, per-lifetime signal yields,
/// datacard fill, external limit fit, report scrape, JSON record.
pub fn run_limits(config: &LimitsConfig) -> Result<PathBuf, PipelineError> {
    info!(
        path = %config.data_path.display(),
        "reading data minituple (this may take a few minutes)"
    );
    let data = load_sample(&config.data_path)?;
    info!(
        events = data.events.len(),
        rows = data.n_read,
        "data skim loaded"
    );

    let background = stage1_background::run(&data.events, &config.cuts, config.lumi_sf)?;

    info!(path = %config.signal_path.display(), "reading signal minituple");
    let signal = load_sample(&config.signal_path)?;
    info!(
        events = signal.events.len(),
        rows = signal.n_read,
        "signal skim loaded"
    );

    let parser = ReportParser::new()?;
    let unique_tag = config.cuts.unique_tag();
    let mut accumulator = RecordAccumulator::new();

    for &ctau_target in &config.lifetimes {
        info!(ctau_target, "processing lifetime point");

        let yields =
            stage2_yields::run(&signal.events, &config.cuts, config.ctau_sample, ctau_target);
        info!(
            sig_ljdc = yields.ljdc * SIGNAL_SCALE,
            sig_sjdc = yields.sjdc * SIGNAL_SCALE,
            "datacard signal yields"
        );

        let values = DatacardValues {
            sig_ljdc: yields.ljdc * SIGNAL_SCALE,
            sig_sjdc: yields.sjdc * SIGNAL_SCALE,
            bkg_ljdc: background.nominal.ljdc,
            bkg_sjdc: background.nominal.sjdc,
            bkg_ljdc_btag: background.btagged.ljdc,
            bkg_ljdc_nobtag: background.bvetoed.ljdc,
            bkg_sjdc_btag: background.btagged.sjdc,
            bkg_sjdc_nobtag: background.bvetoed.sjdc,
        };
        let datacard =
            stage3_datacard::fill(&config.template_path, &unique_tag, ctau_target, &values)?;

        let point = stage4_combine::run_point(
            &config.combine_program,
            &datacard,
            &parser,
            SIGNAL_SCALE,
        );
        if !point.complete {
            warn!(
                ctau_target,
                "could not extract all limit information (full report at debug level)"
            );
        }

        accumulator.push(ctau_target, &yields, &point);
    }

    let record = accumulator.finish(&background.nominal);
    let path = stage5_record::write(&record, &config.output_dir, &config.cuts.record_name())?;
    info!(path = %path.display(), "result record written");
    Ok(path)
}
