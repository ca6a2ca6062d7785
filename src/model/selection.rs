use crate::input::Event;
use crate::model::cuts::CutConfig;

/// Inclusive-score sideband upper edge defining the tag-depleted control
/// region on the non-candidate jet.
pub const INCL_SIDEBAND: f64 = 0.2;

/// Which jet plays the depth-tag-candidate role. The two categories are
/// mutually exclusive: the role jet must be a depth-tag candidate and the
/// other jet an inclusive-tag candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JetRole {
    /// Leading-jet depth-tag candidate (LJDC).
    Leading,
    /// Sub-leading-jet depth-tag candidate (SJDC).
    Subleading,
}

impl JetRole {
    pub const ALL: [JetRole; 2] = [JetRole::Leading, JetRole::Subleading];

    /// Index of the depth-tag-candidate jet in `Event::jets`.
    pub fn depth_jet(self) -> usize {
        match self {
            JetRole::Leading => 0,
            JetRole::Subleading => 1,
        }
    }

    /// Index of the inclusive-tag-candidate jet.
    pub fn incl_jet(self) -> usize {
        1 - self.depth_jet()
    }

    pub fn label(self) -> &'static str {
        match self {
            JetRole::Leading => "ljdc",
            JetRole::Subleading => "sjdc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Tag-depleted sideband: other-jet inclusive score below `INCL_SIDEBAND`.
    ControlUntagged,
    /// Sideband events whose role jet additionally passes the depth cut.
    ControlTagged,
    /// Other-jet inclusive score above the signal-region cut. No depth
    /// requirement; this is the transfer-factor numerator sample.
    Signal,
}

/// Optional b-tag sub-cut on the depth-candidate jet, AND-ed onto the
/// category selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BTagCut {
    Inclusive,
    Tagged(f64),
    Vetoed(f64),
}

impl BTagCut {
    fn passes(self, btag_prob: f64) -> bool {
        match self {
            BTagCut::Inclusive => true,
            BTagCut::Tagged(threshold) => btag_prob > threshold,
            BTagCut::Vetoed(threshold) => btag_prob < threshold,
        }
    }
}

/// A fully specified category selection, evaluated directly against events
/// instead of going through string-templated cut expressions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategorySelection {
    pub role: JetRole,
    pub region: Region,
    pub incl_score_cut: f64,
    pub depth_score_cut: f64,
    pub btag: BTagCut,
}

impl CategorySelection {
    pub fn new(role: JetRole, region: Region, cuts: &CutConfig, btag: BTagCut) -> Self {
        Self {
            role,
            region,
            incl_score_cut: cuts.incl_score,
            depth_score_cut: cuts.depth_score,
            btag,
        }
    }

    pub fn passes(&self, event: &Event) -> bool {
        let depth_jet = &event.jets[self.role.depth_jet()];
        let incl_jet = &event.jets[self.role.incl_jet()];

        if !depth_jet.depth_tag_cand || !incl_jet.incl_tag_cand {
            return false;
        }
        if !self.btag.passes(depth_jet.btag_prob) {
            return false;
        }

        match self.region {
            Region::ControlUntagged => incl_jet.score_incl < INCL_SIDEBAND,
            Region::ControlTagged => {
                incl_jet.score_incl < INCL_SIDEBAND
                    && depth_jet.score_depth > self.depth_score_cut
            }
            Region::Signal => incl_jet.score_incl > self.incl_score_cut,
        }
    }
}

/// Signal-region selection for signal yields: the category's signal region
/// with the depth-tag requirement on the role jet.
pub fn passes_signal_selection(event: &Event, role: JetRole, cuts: &CutConfig) -> bool {
    let signal_region = CategorySelection::new(role, Region::Signal, cuts, BTagCut::Inclusive);
    signal_region.passes(event)
        && event.jets[role.depth_jet()].score_depth > cuts.depth_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Jet;

    fn cuts() -> CutConfig {
        CutConfig::new("test", 0.9, 0.8)
    }

    fn candidate_event(role: JetRole) -> Event {
        let mut ev = Event::default();
        ev.jets[role.depth_jet()] = Jet {
            depth_tag_cand: true,
            score_depth: 0.95,
            btag_prob: 0.5,
            ..Jet::default()
        };
        ev.jets[role.incl_jet()] = Jet {
            incl_tag_cand: true,
            score_incl: 0.1,
            ..Jet::default()
        };
        ev
    }

    #[test]
    fn test_roles_are_mutually_exclusive() {
        for role in JetRole::ALL {
            let ev = candidate_event(role);
            let sel = CategorySelection::new(role, Region::ControlUntagged, &cuts(), BTagCut::Inclusive);
            assert!(sel.passes(&ev));
            let other = match role {
                JetRole::Leading => JetRole::Subleading,
                JetRole::Subleading => JetRole::Leading,
            };
            let sel_other =
                CategorySelection::new(other, Region::ControlUntagged, &cuts(), BTagCut::Inclusive);
            assert!(!sel_other.passes(&ev));
        }
    }

    #[test]
    fn test_regions_partition_on_incl_score() {
        let role = JetRole::Leading;
        let mut ev = candidate_event(role);

        let cr = CategorySelection::new(role, Region::ControlUntagged, &cuts(), BTagCut::Inclusive);
        let sr = CategorySelection::new(role, Region::Signal, &cuts(), BTagCut::Inclusive);

        ev.jets[role.incl_jet()].score_incl = 0.1;
        assert!(cr.passes(&ev) && !sr.passes(&ev));

        ev.jets[role.incl_jet()].score_incl = 0.5; // between sideband and cut
        assert!(!cr.passes(&ev) && !sr.passes(&ev));

        ev.jets[role.incl_jet()].score_incl = 0.95;
        assert!(!cr.passes(&ev) && sr.passes(&ev));
    }

    #[test]
    fn test_control_tagged_requires_depth_score() {
        let role = JetRole::Subleading;
        let mut ev = candidate_event(role);
        let tagged =
            CategorySelection::new(role, Region::ControlTagged, &cuts(), BTagCut::Inclusive);

        assert!(tagged.passes(&ev));
        ev.jets[role.depth_jet()].score_depth = 0.5;
        assert!(!tagged.passes(&ev));
    }

    #[test]
    fn test_btag_cut_applies_to_depth_jet() {
        let role = JetRole::Leading;
        let ev = candidate_event(role); // depth jet btag_prob = 0.5
        let c = cuts();

        let tagged = CategorySelection::new(role, Region::ControlUntagged, &c, BTagCut::Tagged(0.2435));
        let vetoed = CategorySelection::new(role, Region::ControlUntagged, &c, BTagCut::Vetoed(0.2435));
        assert!(tagged.passes(&ev));
        assert!(!vetoed.passes(&ev));
    }

    #[test]
    fn test_signal_selection_needs_depth_tag() {
        let role = JetRole::Leading;
        let mut ev = candidate_event(role);
        ev.jets[role.incl_jet()].score_incl = 0.95;

        assert!(passes_signal_selection(&ev, role, &cuts()));
        ev.jets[role.depth_jet()].score_depth = 0.5;
        assert!(!passes_signal_selection(&ev, role, &cuts()));
    }
}
