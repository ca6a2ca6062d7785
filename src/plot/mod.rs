use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod data;
pub mod multi;
pub mod single;
pub mod style;

use crate::pipeline::stage5_record::RecordError;
use style::PlotStyle;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("no result records given")]
    NoInputs,
    #[error("no plottable lifetime points in {0}")]
    Empty(String),
    #[error("draw error: {0}")]
    Draw(String),
}

/// plotters error types are generic over the backend; collapse them to text.
pub(crate) fn draw_err<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Draw(err.to_string())
}

/// Stage-two entry point. Mode is chosen by argument count: a single path
/// renders the Brazil-band plot, a tag followed by paths renders the
/// multi-record overlay.
pub fn run_plot(args: &[String], plots_dir: &Path, style: &PlotStyle) -> Result<PathBuf, PlotError> {
    match args {
        [] => Err(PlotError::NoInputs),
        [record] => single::render_single(Path::new(record), plots_dir, style),
        [tag, records @ ..] => {
            let paths: Vec<PathBuf> = records.iter().map(PathBuf::from).collect();
            multi::render_multi(tag, &paths, plots_dir, style)
        }
    }
}
