use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

/// Placeholder segment that the template filename must carry; it is replaced
/// with the run identifier to derive the output filename.
const TEMPLATE_MARKER: &str = "TEMPLATE";

#[derive(Debug, Error)]
pub enum DatacardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("template filename {0} does not contain the {TEMPLATE_MARKER} marker")]
    MissingTemplateMarker(PathBuf),
    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Numbers filled into the datacard, already in datacard units (signal
/// yields scaled by the signal scale factor).
#[derive(Debug, Clone, Copy, Default)]
pub struct DatacardValues {
    pub sig_ljdc: f64,
    pub sig_sjdc: f64,
    pub bkg_ljdc: f64,
    pub bkg_sjdc: f64,
    pub bkg_ljdc_btag: f64,
    pub bkg_ljdc_nobtag: f64,
    pub bkg_sjdc_btag: f64,
    pub bkg_sjdc_nobtag: f64,
}

impl DatacardValues {
    fn replacements(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SIGLJDC", format_rate(self.sig_ljdc)),
            ("SIGSJDC", format_rate(self.sig_sjdc)),
            ("BKGLJDC", format_rate(self.bkg_ljdc)),
            ("BKGSJDC", format_rate(self.bkg_sjdc)),
            ("BKGLJ_B", format_rate(self.bkg_ljdc_btag)),
            ("BKGLJ_XB", format_rate(self.bkg_ljdc_nobtag)),
            ("BKGSJ_B", format_rate(self.bkg_sjdc_btag)),
            ("BKGSJ_XB", format_rate(self.bkg_sjdc_nobtag)),
        ]
    }
}

fn format_rate(value: f64) -> String {
    format!("{value:04.2}")
}

/// Replace every token occurrence via one combined alternation, longest
/// token first so no token can shadow a longer one sharing its prefix.
pub fn substitute(text: &str, replacements: &[(&'static str, String)]) -> Result<String, regex::Error> {
    let mut tokens: Vec<&str> = replacements.iter().map(|(token, _)| *token).collect();
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let pattern = tokens
        .iter()
        .map(|token| regex::escape(token))
        .collect::<Vec<_>>()
        .join("|");
    let re = Regex::new(&pattern)?;
    let out = re.replace_all(text, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        replacements
            .iter()
            .find(|(token, _)| *token == matched)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    });
    Ok(out.into_owned())
}

/// Derive the filled-datacard path from the template path by replacing the
/// `TEMPLATE` filename segment with `{unique_tag}__{ctau}`.
pub fn output_path(
    template: &Path,
    unique_tag: &str,
    ctau_target: f64,
) -> Result<PathBuf, DatacardError> {
    let name = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if !name.contains(TEMPLATE_MARKER) {
        return Err(DatacardError::MissingTemplateMarker(template.to_path_buf()));
    }
    let run_id = format!("{}__{}", unique_tag, format_ctau(ctau_target));
    let out_name = name.replace(TEMPLATE_MARKER, &run_id);
    Ok(template.with_file_name(out_name))
}

/// Lifetimes are written without a trailing `.0` when integral.
pub fn format_ctau(ctau: f64) -> String {
    if ctau.fract() == 0.0 && ctau.abs() < 1e15 {
        format!("{}", ctau as i64)
    } else {
        format!("{ctau}")
    }
}

/// Read the template, substitute every token, and write the filled datacard
/// next to the template. Returns the filled datacard path.
pub fn fill(
    template: &Path,
    unique_tag: &str,
    ctau_target: f64,
    values: &DatacardValues,
) -> Result<PathBuf, DatacardError> {
    let out_path = output_path(template, unique_tag, ctau_target)?;
    let text = fs::read_to_string(template)?;
    let filled = substitute(&text, &values.replacements())?;
    fs::write(&out_path, filled)?;
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> DatacardValues {
        DatacardValues {
            sig_ljdc: 0.5,
            sig_sjdc: 1.25,
            bkg_ljdc: 17.0,
            bkg_sjdc: 3.333,
            bkg_ljdc_btag: 4.0,
            bkg_ljdc_nobtag: 13.0,
            bkg_sjdc_btag: 1.0,
            bkg_sjdc_nobtag: 2.333,
        }
    }

    #[test]
    fn test_rate_formatting_two_decimals_zero_padded() {
        assert_eq!(format_rate(0.5), "0.50");
        assert_eq!(format_rate(17.0), "17.00");
        assert_eq!(format_rate(3.333), "3.33");
    }

    #[test]
    fn test_substitute_replaces_all_tokens() {
        let text = "rate SIGLJDC BKGLJDC SIGSJDC BKGSJDC\nsplit BKGLJ_B BKGLJ_XB BKGSJ_B BKGSJ_XB\n";
        let out = substitute(text, &values().replacements()).unwrap();
        assert_eq!(
            out,
            "rate 0.50 17.00 1.25 3.33\nsplit 4.00 13.00 1.00 2.33\n"
        );
    }

    #[test]
    fn test_substitute_prefers_longer_tokens() {
        // BKGLJ_XB must never be matched as some shorter token plus a suffix.
        let reps = vec![
            ("BKG", "short".to_string()),
            ("BKGLJ_XB", "long".to_string()),
        ];
        let out = substitute("BKGLJ_XB BKG", &reps).unwrap();
        assert_eq!(out, "long short");
    }

    #[test]
    fn test_substitute_is_idempotent_once_tokens_are_gone() {
        let text = "rate SIGLJDC BKGSJDC\n";
        let reps = values().replacements();
        let once = substitute(text, &reps).unwrap();
        let twice = substitute(&once, &reps).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_output_path_replaces_marker() {
        let out = output_path(
            Path::new("templates/datacard_TEMPLATE.txt"),
            "tag_0.9_0.8",
            1000.0,
        )
        .unwrap();
        assert_eq!(
            out,
            PathBuf::from("templates/datacard_tag_0.9_0.8__1000.txt")
        );
    }

    #[test]
    fn test_output_path_without_marker_is_an_error() {
        let err = output_path(Path::new("templates/datacard.txt"), "tag", 10.0).unwrap_err();
        assert!(matches!(err, DatacardError::MissingTemplateMarker(_)));
    }

    #[test]
    fn test_format_ctau() {
        assert_eq!(format_ctau(1000.0), "1000");
        assert_eq!(format_ctau(12.5), "12.5");
    }

    #[test]
    fn test_fill_writes_next_to_template() {
        let dir = std::env::temp_dir();
        let template = dir.join(format!(
            "llp-limits-{}-datacard_TEMPLATE.txt",
            std::process::id()
        ));
        fs::write(&template, "rate SIGLJDC BKGLJDC\n").unwrap();

        let out = fill(&template, "t_0.9_0.8", 100.0, &values()).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        fs::remove_file(&template).ok();
        fs::remove_file(&out).ok();

        assert!(out.to_string_lossy().contains("t_0.9_0.8__100"));
        assert_eq!(text, "rate 0.50 17.00\n");
    }
}
