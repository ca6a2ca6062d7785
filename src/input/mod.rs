use std::path::Path;

pub mod minituple;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// One reconstructed jet as stored in the minituple.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Jet {
    pub depth_tag_cand: bool,
    pub incl_tag_cand: bool,
    pub score_incl: f64,
    pub score_depth: f64,
    pub btag_prob: f64,
}

/// One preselected event. `jets[0]` is the leading jet, `jets[1]` the
/// sub-leading jet. Decay lengths are in cm; signal-only fields default to
/// 0.0 (decay length) and 1.0 (weight) for data samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub jets: [Jet; 2],
    pub llp_decay_ctau: [f64; 2],
    pub weight: f64,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            jets: [Jet::default(); 2],
            llp_decay_ctau: [0.0; 2],
            weight: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSample {
    /// Events passing `Pass_PreSel == 1`.
    pub events: Vec<Event>,
    /// Rows in the file before the preselection skim.
    pub n_read: usize,
}

pub fn load_sample(path: &Path) -> Result<EventSample, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(path.display().to_string()));
    }
    minituple::read_minituple(path)
}
