use std::path::Path;
use std::process::Command;

use regex::Regex;
use tracing::{debug, warn};

/// Expected-limit percentile labels, exactly as they appear in the report
/// (including the leading space of ` 2.5`). These strings are also the
/// `limits_exp` keys of the result record.
pub const EXPECTED_PERCENT: [&str; 5] = [" 2.5", "16.0", "50.0", "84.0", "97.5"];

pub const MISSING: f64 = -1.0;

/// Limit values for one lifetime point. `MISSING` marks a field whose report
/// line could not be extracted; `complete` is true only when all six fields
/// were found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitPoint {
    pub observed: f64,
    pub expected: [f64; 5],
    pub complete: bool,
}

impl LimitPoint {
    pub fn failed() -> Self {
        Self {
            observed: MISSING,
            expected: [MISSING; 5],
            complete: false,
        }
    }
}

/// Pattern matcher for the limit tool's text report. The report format is an
/// implicit contract with the external tool; keeping all patterns here means
/// a structured-output replacement only touches this module.
#[derive(Debug)]
pub struct ReportParser {
    observed: Regex,
    expected: [Regex; 5],
}

impl ReportParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            observed: Regex::new(r"Observed Limit:\s*r\s*<\s*([0-9.]+)")?,
            expected: [
                expected_re(EXPECTED_PERCENT[0])?,
                expected_re(EXPECTED_PERCENT[1])?,
                expected_re(EXPECTED_PERCENT[2])?,
                expected_re(EXPECTED_PERCENT[3])?,
                expected_re(EXPECTED_PERCENT[4])?,
            ],
        })
    }

    /// Extract the six limit values, each scaled by `scale`. A missing line
    /// yields `MISSING` for that field and clears `complete`.
    pub fn parse(&self, report: &str, scale: f64) -> LimitPoint {
        let mut complete = true;
        let observed = match extract(&self.observed, report) {
            Some(value) => value * scale,
            None => {
                complete = false;
                MISSING
            }
        };
        let mut expected = [MISSING; 5];
        for (i, re) in self.expected.iter().enumerate() {
            match extract(re, report) {
                Some(value) => expected[i] = value * scale,
                None => complete = false,
            }
        }
        LimitPoint {
            observed,
            expected,
            complete,
        }
    }
}

fn expected_re(label: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"Expected {}%:\s*r\s*<\s*([0-9.]+)",
        regex::escape(label)
    ))
}

fn extract(re: &Regex, report: &str) -> Option<f64> {
    re.captures(report)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Run the external limit-setting tool on a filled datacard and parse its
/// report. Blocking, no timeout. Spawn failure or non-zero exit is fatal for
/// this lifetime point only: a warning is logged and sentinels are returned
/// so the caller can continue with the next point.
pub fn run_point(
    program: &str,
    datacard: &Path,
    parser: &ReportParser,
    scale: f64,
) -> LimitPoint {
    let output = Command::new(program)
        .arg("-M")
        .arg("AsymptoticLimits")
        .arg(datacard)
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let report = String::from_utf8_lossy(&out.stdout);
            debug!("limit tool report:\n{report}");
            parser.parse(&report, scale)
        }
        Ok(out) => {
            warn!(
                status = %out.status,
                datacard = %datacard.display(),
                "limit tool exited with failure"
            );
            debug!("stderr:\n{}", String::from_utf8_lossy(&out.stderr));
            LimitPoint::failed()
        }
        Err(err) => {
            warn!(
                program,
                error = %err,
                "failed to launch limit tool"
            );
            LimitPoint::failed()
        }
    }
}
