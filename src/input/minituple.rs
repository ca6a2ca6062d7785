use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::debug;

use crate::input::{Event, EventSample, InputError, Jet};

const COL_PASS_PRESEL: &str = "Pass_PreSel";
const COL_DEPTH_CAND: [&str; 2] = ["jet0_DepthTagCand", "jet1_DepthTagCand"];
const COL_INCL_CAND: [&str; 2] = ["jet0_InclTagCand", "jet1_InclTagCand"];
const COL_SCORE_INCL: [&str; 2] = ["jet0_scores_inc_train80", "jet1_scores_inc_train80"];
const COL_SCORE_DEPTH: [&str; 2] = [
    "jet0_scores_depth_LLPanywhere",
    "jet1_scores_depth_LLPanywhere",
];
const COL_BTAG: [&str; 2] = ["jet0_DeepCSV_prob_b", "jet1_DeepCSV_prob_b"];
const COL_WEIGHT: &str = "weight";
const COL_LLP_CTAU: [&str; 2] = ["LLP0_DecayCtau", "LLP1_DecayCtau"];

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        let reader: Box<dyn Read> = Box::new(MultiGzDecoder::new(file));
        Ok(Box::new(BufReader::new(reader)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[derive(Debug, Clone)]
struct Columns {
    pass_presel: usize,
    depth_cand: [usize; 2],
    incl_cand: [usize; 2],
    score_incl: [usize; 2],
    score_depth: [usize; 2],
    btag: [usize; 2],
    weight: Option<usize>,
    llp_ctau: [Option<usize>; 2],
}

impl Columns {
    fn from_header(header: &str) -> Result<Self, InputError> {
        let names: Vec<&str> = header.split_whitespace().collect();
        let find = |name: &str| names.iter().position(|n| *n == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| InputError::MissingColumn(name.to_string()))
        };

        Ok(Columns {
            pass_presel: require(COL_PASS_PRESEL)?,
            depth_cand: [require(COL_DEPTH_CAND[0])?, require(COL_DEPTH_CAND[1])?],
            incl_cand: [require(COL_INCL_CAND[0])?, require(COL_INCL_CAND[1])?],
            score_incl: [require(COL_SCORE_INCL[0])?, require(COL_SCORE_INCL[1])?],
            score_depth: [require(COL_SCORE_DEPTH[0])?, require(COL_SCORE_DEPTH[1])?],
            btag: [require(COL_BTAG[0])?, require(COL_BTAG[1])?],
            weight: find(COL_WEIGHT),
            llp_ctau: [find(COL_LLP_CTAU[0]), find(COL_LLP_CTAU[1])],
        })
    }
}

/// Read a whitespace-delimited minituple, skimming to `Pass_PreSel == 1`.
pub fn read_minituple(path: &Path) -> Result<EventSample, InputError> {
    let mut reader = open_maybe_gz(path)?;

    let mut buf = String::new();
    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(InputError::Parse(format!(
            "{} is empty (missing header row)",
            path.display()
        )));
    }
    let columns = Columns::from_header(buf.trim_end())?;

    let mut events = Vec::new();
    let mut n_read = 0usize;
    let mut line_no = 1usize;
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        n_read += 1;

        let fields: Vec<&str> = line.split_whitespace().collect();
        if !parse_flag(&fields, columns.pass_presel, line_no)? {
            continue;
        }
        events.push(parse_event(&fields, &columns, line_no)?);
    }

    debug!(
        rows = n_read,
        skimmed = events.len(),
        "minituple {} read",
        path.display()
    );

    Ok(EventSample { events, n_read })
}

fn parse_event(fields: &[&str], columns: &Columns, line_no: usize) -> Result<Event, InputError> {
    let mut jets = [Jet::default(); 2];
    for (j, jet) in jets.iter_mut().enumerate() {
        jet.depth_tag_cand = parse_flag(fields, columns.depth_cand[j], line_no)?;
        jet.incl_tag_cand = parse_flag(fields, columns.incl_cand[j], line_no)?;
        jet.score_incl = parse_value(fields, columns.score_incl[j], line_no)?;
        jet.score_depth = parse_value(fields, columns.score_depth[j], line_no)?;
        jet.btag_prob = parse_value(fields, columns.btag[j], line_no)?;
    }

    let weight = match columns.weight {
        Some(idx) => parse_value(fields, idx, line_no)?,
        None => 1.0,
    };
    let mut llp_decay_ctau = [0.0f64; 2];
    for (i, slot) in llp_decay_ctau.iter_mut().enumerate() {
        if let Some(idx) = columns.llp_ctau[i] {
            *slot = parse_value(fields, idx, line_no)?;
        }
    }

    Ok(Event {
        jets,
        llp_decay_ctau,
        weight,
    })
}

fn parse_value(fields: &[&str], idx: usize, line_no: usize) -> Result<f64, InputError> {
    let raw = fields.get(idx).ok_or_else(|| {
        InputError::Parse(format!("line {}: missing field at column {}", line_no, idx))
    })?;
    raw.parse::<f64>().map_err(|_| {
        InputError::Parse(format!("line {}: invalid number {:?}", line_no, raw))
    })
}

fn parse_flag(fields: &[&str], idx: usize, line_no: usize) -> Result<bool, InputError> {
    Ok(parse_value(fields, idx, line_no)? == 1.0)
}
