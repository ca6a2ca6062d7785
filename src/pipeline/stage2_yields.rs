use tracing::debug;

use crate::input::Event;
use crate::model::cuts::CutConfig;
use crate::model::reweight::{SignalYields, reweighted_yields};

pub fn run(
    signal_events: &[Event],
    cuts: &CutConfig,
    ctau_sample: f64,
    ctau_target: f64,
) -> SignalYields {
    let yields = reweighted_yields(signal_events, cuts, ctau_sample, ctau_target);
    debug!(
        ctau_target,
        ljdc = yields.ljdc,
        sjdc = yields.sjdc,
        "reweighted signal yields"
    );
    yields
}
