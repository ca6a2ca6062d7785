/// Signal-region score thresholds plus the file tag identifying the run.
///
/// Together with the input sample tag this uniquely identifies a result
/// record; both derived names embed the thresholds so that scans over cut
/// values never collide on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CutConfig {
    pub incl_score: f64,
    pub depth_score: f64,
    pub filetag: String,
}

impl CutConfig {
    pub fn new(filetag: impl Into<String>, incl_score: f64, depth_score: f64) -> Self {
        Self {
            incl_score,
            depth_score,
            filetag: filetag.into(),
        }
    }

    /// Run identifier used in datacard filenames.
    pub fn unique_tag(&self) -> String {
        format!("{}_{}_{}", self.filetag, self.incl_score, self.depth_score)
    }

    /// Result-record filename (without directory).
    pub fn record_name(&self) -> String {
        format!(
            "{}_inc{}_depth{}.json",
            self.filetag, self.incl_score, self.depth_score
        )
    }
}
