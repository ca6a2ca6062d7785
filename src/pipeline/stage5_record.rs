use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::background::BackgroundPrediction;
use crate::model::reweight::SignalYields;
use crate::pipeline::stage4_combine::{EXPECTED_PERCENT, LimitPoint};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("length mismatch: {field} has {found} entries, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("missing expected-limit percentile {0:?}")]
    MissingPercentile(String),
}

/// The stage-one output contract: one record per (sample, cut) combination,
/// immutable once written. The percentile keys of `limits_exp` carry the
/// report labels verbatim, leading space included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub ctaus: Vec<f64>,
    pub limits_obs: Vec<f64>,
    pub limits_exp: BTreeMap<String, Vec<f64>>,
    pub nevents_sig_ljdc: Vec<f64>,
    pub nevents_sig_sjdc: Vec<f64>,
    pub nevents_bkg_ljdc: f64,
    pub nevents_bkg_sjdc: f64,
}

impl ResultRecord {
    /// All per-lifetime lists must stay aligned with `ctaus`; `-1` sentinels
    /// keep failed points in place rather than shortening a list.
    pub fn validate(&self) -> Result<(), RecordError> {
        let n = self.ctaus.len();
        let check = |field: &str, len: usize| -> Result<(), RecordError> {
            if len != n {
                return Err(RecordError::LengthMismatch {
                    field: field.to_string(),
                    expected: n,
                    found: len,
                });
            }
            Ok(())
        };
        check("limits_obs", self.limits_obs.len())?;
        check("nevents_sig_ljdc", self.nevents_sig_ljdc.len())?;
        check("nevents_sig_sjdc", self.nevents_sig_sjdc.len())?;
        for label in EXPECTED_PERCENT {
            let values = self
                .limits_exp
                .get(label)
                .ok_or_else(|| RecordError::MissingPercentile(label.to_string()))?;
            check(&format!("limits_exp[{label:?}]"), values.len())?;
        }
        Ok(())
    }

    pub fn expected(&self, label: &str) -> Result<&[f64], RecordError> {
        self.limits_exp
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| RecordError::MissingPercentile(label.to_string()))
    }
}

/// Accumulates per-lifetime-point results in parallel lists.
#[derive(Debug)]
pub struct RecordAccumulator {
    ctaus: Vec<f64>,
    limits_obs: Vec<f64>,
    limits_exp: BTreeMap<String, Vec<f64>>,
    nevents_sig_ljdc: Vec<f64>,
    nevents_sig_sjdc: Vec<f64>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        let mut limits_exp = BTreeMap::new();
        for label in EXPECTED_PERCENT {
            limits_exp.insert(label.to_string(), Vec::new());
        }
        Self {
            ctaus: Vec::new(),
            limits_obs: Vec::new(),
            limits_exp,
            nevents_sig_ljdc: Vec::new(),
            nevents_sig_sjdc: Vec::new(),
        }
    }

    /// Every lifetime point is appended, failed ones included, so the list
    /// lengths never drift apart.
    pub fn push(&mut self, ctau: f64, yields: &SignalYields, point: &LimitPoint) {
        self.ctaus.push(ctau);
        self.limits_obs.push(point.observed);
        for (label, value) in EXPECTED_PERCENT.iter().zip(point.expected) {
            if let Some(list) = self.limits_exp.get_mut(*label) {
                list.push(value);
            }
        }
        self.nevents_sig_ljdc.push(yields.ljdc);
        self.nevents_sig_sjdc.push(yields.sjdc);
    }

    pub fn finish(self, background: &BackgroundPrediction) -> ResultRecord {
        ResultRecord {
            ctaus: self.ctaus,
            limits_obs: self.limits_obs,
            limits_exp: self.limits_exp,
            nevents_sig_ljdc: self.nevents_sig_ljdc,
            nevents_sig_sjdc: self.nevents_sig_sjdc,
            nevents_bkg_ljdc: background.ljdc,
            nevents_bkg_sjdc: background.sjdc,
        }
    }
}

impl Default for RecordAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize the record as 2-space-indented JSON at
/// `{output_dir}/{record_name}`, creating the directory if needed.
pub fn write(
    record: &ResultRecord,
    output_dir: &Path,
    record_name: &str,
) -> Result<PathBuf, RecordError> {
    fs::create_dir_all(output_dir)?;
    let path = output_dir.join(record_name);
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    record.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(path)
}

pub fn load(path: &Path) -> Result<ResultRecord, RecordError> {
    let text = fs::read_to_string(path)?;
    let record: ResultRecord = serde_json::from_str(&text)?;
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(observed: f64) -> LimitPoint {
        LimitPoint {
            observed,
            expected: [0.1, 0.2, 0.3, 0.4, 0.6],
            complete: observed >= 0.0,
        }
    }

    fn sample_record() -> ResultRecord {
        let mut acc = RecordAccumulator::new();
        acc.push(
            100.0,
            &SignalYields {
                ljdc: 5.0,
                sjdc: 2.0,
            },
            &point(0.5),
        );
        acc.push(
            1000.0,
            &SignalYields {
                ljdc: 6.0,
                sjdc: 3.0,
            },
            &LimitPoint::failed(),
        );
        acc.finish(&BackgroundPrediction {
            ljdc: 17.0,
            sjdc: 4.25,
        })
    }

    #[test]
    fn test_lists_stay_aligned_including_failed_points() {
        let record = sample_record();
        record.validate().unwrap();
        assert_eq!(record.ctaus, vec![100.0, 1000.0]);
        assert_eq!(record.limits_obs[1], -1.0);
        for label in EXPECTED_PERCENT {
            assert_eq!(record.limits_exp[label].len(), 2, "label {label:?}");
        }
    }

    #[test]
    fn test_validate_catches_length_drift() {
        let mut record = sample_record();
        record.limits_obs.pop();
        assert!(matches!(
            record.validate(),
            Err(RecordError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_catches_missing_percentile() {
        let mut record = sample_record();
        record.limits_exp.remove(" 2.5");
        assert!(matches!(
            record.validate(),
            Err(RecordError::MissingPercentile(_))
        ));
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let record = sample_record();
        let dir = std::env::temp_dir().join(format!("llp-limits-rec-{}", std::process::id()));
        let path = write(&record, &dir, "tag_inc0.9_depth0.8.json").unwrap();
        let loaded = load(&path).unwrap();
        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();

        assert_eq!(loaded.ctaus, record.ctaus);
        assert_eq!(loaded.nevents_bkg_ljdc, 17.0);
        assert_eq!(loaded.limits_exp[" 2.5"], record.limits_exp[" 2.5"]);
    }

    #[test]
    fn test_written_json_key_names() {
        let record = sample_record();
        let dir = std::env::temp_dir().join(format!("llp-limits-keys-{}", std::process::id()));
        let path = write(&record, &dir, "keys.json").unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();
        fs::remove_dir(&dir).ok();

        for key in [
            "\"ctaus\"",
            "\"limits_obs\"",
            "\"limits_exp\"",
            "\" 2.5\"",
            "\"97.5\"",
            "\"nevents_sig_ljdc\"",
            "\"nevents_bkg_sjdc\"",
        ] {
            assert!(text.contains(key), "missing {key} in {text}");
        }
    }
}
