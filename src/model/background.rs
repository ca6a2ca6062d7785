use thiserror::Error;
use tracing::debug;

use crate::input::Event;
use crate::model::cuts::CutConfig;
use crate::model::selection::{BTagCut, CategorySelection, JetRole, Region};

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("empty untagged control region for {role}; transfer factor is undefined")]
    EmptyControlRegion { role: &'static str },
}

/// Raw event counts in the three regions of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCounts {
    pub control_untagged: u64,
    pub control_tagged: u64,
    pub signal: u64,
}

/// Signal-region background prediction for the two categories.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackgroundPrediction {
    pub ljdc: f64,
    pub sjdc: f64,
}

impl BackgroundPrediction {
    pub fn for_role(&self, role: JetRole) -> f64 {
        match role {
            JetRole::Leading => self.ljdc,
            JetRole::Subleading => self.sjdc,
        }
    }
}

pub fn count_regions(
    events: &[Event],
    role: JetRole,
    cuts: &CutConfig,
    btag: BTagCut,
) -> RegionCounts {
    let untagged = CategorySelection::new(role, Region::ControlUntagged, cuts, btag);
    let tagged = CategorySelection::new(role, Region::ControlTagged, cuts, btag);
    let signal = CategorySelection::new(role, Region::Signal, cuts, btag);

    let mut counts = RegionCounts::default();
    for event in events {
        if untagged.passes(event) {
            counts.control_untagged += 1;
        }
        if tagged.passes(event) {
            counts.control_tagged += 1;
        }
        if signal.passes(event) {
            counts.signal += 1;
        }
    }
    counts
}

/// Transfer-factor background estimate:
/// `lumi_sf * N_signal_region * (N_control_tagged / N_control_untagged)`
/// per category. An empty untagged control region is an error; the caller
/// decides whether the run can proceed.
pub fn predict_background(
    events: &[Event],
    cuts: &CutConfig,
    lumi_sf: f64,
    btag: BTagCut,
) -> Result<BackgroundPrediction, BackgroundError> {
    let mut prediction = BackgroundPrediction::default();
    for role in JetRole::ALL {
        let counts = count_regions(events, role, cuts, btag);
        debug!(
            role = role.label(),
            cr_untagged = counts.control_untagged,
            cr_tagged = counts.control_tagged,
            sr = counts.signal,
            "background region counts"
        );
        if counts.control_untagged == 0 {
            return Err(BackgroundError::EmptyControlRegion { role: role.label() });
        }
        let transfer_factor = counts.control_tagged as f64 / counts.control_untagged as f64;
        let predicted = lumi_sf * counts.signal as f64 * transfer_factor;
        match role {
            JetRole::Leading => prediction.ljdc = predicted,
            JetRole::Subleading => prediction.sjdc = predicted,
        }
    }
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Jet;

    fn cuts() -> CutConfig {
        CutConfig::new("test", 0.9, 0.8)
    }

    fn event(role: JetRole, incl_score: f64, depth_score: f64) -> Event {
        let mut ev = Event::default();
        ev.jets[role.depth_jet()] = Jet {
            depth_tag_cand: true,
            score_depth: depth_score,
            ..Jet::default()
        };
        ev.jets[role.incl_jet()] = Jet {
            incl_tag_cand: true,
            score_incl: incl_score,
            ..Jet::default()
        };
        ev
    }

    #[test]
    fn test_equal_control_counts_give_signal_count_times_lumi() {
        // Tagged and untagged control counts equal and nonzero => transfer
        // factor 1, prediction = N_sr * lumi_sf.
        let mut events = Vec::new();
        for role in JetRole::ALL {
            for _ in 0..7 {
                events.push(event(role, 0.1, 0.95)); // CR, passes depth
            }
            for _ in 0..3 {
                events.push(event(role, 0.95, 0.0)); // SR
            }
        }
        let pred = predict_background(&events, &cuts(), 2.0, BTagCut::Inclusive).unwrap();
        assert!((pred.ljdc - 6.0).abs() < 1e-12);
        assert!((pred.sjdc - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_synthetic_transfer_factor_end_to_end() {
        // 100 events split evenly across the two roles: per role 40 control
        // events of which 10 pass the depth tag, and 10 signal-region events.
        // Prediction per role: 6.8 * 10 * (10/40) = 17.0.
        let mut events = Vec::new();
        for role in JetRole::ALL {
            for i in 0..40 {
                let depth_score = if i < 10 { 0.95 } else { 0.1 };
                events.push(event(role, 0.1, depth_score));
            }
            for _ in 0..10 {
                events.push(event(role, 0.95, 0.0));
            }
        }
        assert_eq!(events.len(), 100);
        let pred = predict_background(&events, &cuts(), 6.8, BTagCut::Inclusive).unwrap();
        assert!((pred.ljdc - 17.0).abs() < 1e-9, "{}", pred.ljdc);
        assert!((pred.sjdc - 17.0).abs() < 1e-9, "{}", pred.sjdc);
    }

    #[test]
    fn test_empty_control_region_is_an_error() {
        // Signal-region events only; the untagged control region is empty.
        let events = vec![event(JetRole::Leading, 0.95, 0.95)];
        let err = predict_background(&events, &cuts(), 1.0, BTagCut::Inclusive).unwrap_err();
        assert!(matches!(
            err,
            BackgroundError::EmptyControlRegion { role: "ljdc" }
        ));
    }

    #[test]
    fn test_btag_subcut_restricts_counts() {
        let role = JetRole::Leading;
        let mut tagged_ev = event(role, 0.1, 0.95);
        tagged_ev.jets[role.depth_jet()].btag_prob = 0.9;
        let untagged_ev = event(role, 0.1, 0.95); // btag_prob 0.0

        let events = vec![tagged_ev, untagged_ev];
        let all = count_regions(&events, role, &cuts(), BTagCut::Inclusive);
        let only_btag = count_regions(&events, role, &cuts(), BTagCut::Tagged(0.2435));
        assert_eq!(all.control_untagged, 2);
        assert_eq!(only_btag.control_untagged, 1);
    }
}
