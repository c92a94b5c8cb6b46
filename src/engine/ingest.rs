//! Reading the engine's CSV artifact back into the canonical table.
//!
//! Every failure here degrades to an empty table plus a warning.

use crate::model::{ResultRow, SimulationResult};
use std::path::Path;
use thiserror::Error;

/// Raw column names written by the engine, in canonical order
/// (Time, InputVoltage, OutputVoltage).
pub const RAW_TIME: &str = "temps";
pub const RAW_INPUT: &str = "Vin";
pub const RAW_OUTPUT: &str = "Vout";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("no columns to parse from file")]
    NoColumns,
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("expected {expected} fields in line {line}, saw {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub result: SimulationResult,
    pub warnings: Vec<String>,
}

/// Read the artifact at `path`, whatever path the caller had in mind for the run.
pub fn ingest(path: &Path) -> Ingested {
    if !path.exists() {
        return Ingested {
            result: SimulationResult::empty(),
            warnings: vec![format!(
                "Output CSV not found after execution: {}",
                path.display()
            )],
        };
    }

    match read_table(path) {
        Ok(result) => {
            tracing::debug!(rows = result.len(), path = %path.display(), "artifact ingested");
            Ingested {
                result,
                warnings: Vec::new(),
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "artifact unreadable");
            Ingested {
                result: SimulationResult::empty(),
                warnings: vec![format!("Could not read engine output: {e}")],
            }
        }
    }
}

/// Load a previous run's artifact for the initial display, if one parses.
pub fn load_existing(path: &Path) -> Option<SimulationResult> {
    if !path.exists() {
        return None;
    }
    read_table(path).ok()
}

pub fn read_table(path: &Path) -> Result<SimulationResult, IngestError> {
    let text = std::fs::read_to_string(path)?;
    parse_table(&text)
}

fn column(header: &[&str], name: &'static str) -> Result<usize, IngestError> {
    header
        .iter()
        .position(|h| *h == name)
        .ok_or(IngestError::MissingColumn(name))
}

fn cell(fields: &[&str], idx: usize) -> f64 {
    fields
        .get(idx)
        .and_then(|f| f.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Parse comma-separated text with a header row and rename the engine's
/// columns to the canonical ones. Unparsable cells become NaN, and so do the
/// missing trailing cells of a short row (an engine killed mid-write leaves
/// one). Rows with more fields than the header are rejected.
pub fn parse_table(text: &str) -> Result<SimulationResult, IngestError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (_, header_line) = lines.next().ok_or(IngestError::NoColumns)?;
    let header: Vec<&str> = header_line
        .trim_start_matches('\u{feff}')
        .split(',')
        .map(str::trim)
        .collect();

    let t_idx = column(&header, RAW_TIME)?;
    let in_idx = column(&header, RAW_INPUT)?;
    let out_idx = column(&header, RAW_OUTPUT)?;

    let mut result = SimulationResult::empty();
    for (line, raw) in lines {
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() > header.len() {
            return Err(IngestError::FieldCount {
                line,
                expected: header.len(),
                found: fields.len(),
            });
        }
        result.push_row(ResultRow {
            time: cell(&fields, t_idx),
            input_voltage: cell(&fields, in_idx),
            output_voltage: cell(&fields, out_idx),
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_engine_columns() {
        let text = "temps,Vin,Vout\n0,0,0\n0.0001,0.15707,0.0000785\n0.0002,0.3141,0.00031\n";
        let r = parse_table(text).unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.time, vec![0.0, 0.0001, 0.0002]);
        assert_eq!(r.input_voltage, vec![0.0, 0.15707, 0.3141]);
        assert_eq!(r.output_voltage, vec![0.0, 0.0000785, 0.00031]);

        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("Time").is_some());
        assert!(json.get("InputVoltage").is_some());
        assert!(json.get("OutputVoltage").is_some());
    }

    #[test]
    fn column_order_in_file_does_not_matter() {
        let r = parse_table("Vout,temps,extra,Vin\n3,1,x,2\n").unwrap();
        assert_eq!(r.head(1)[0].time, 1.0);
        assert_eq!(r.head(1)[0].input_voltage, 2.0);
        assert_eq!(r.head(1)[0].output_voltage, 3.0);
    }

    #[test]
    fn header_only_is_a_valid_empty_table() {
        let r = parse_table("temps,Vin,Vout\n").unwrap();
        assert!(r.is_empty());
    }

    #[test]
    fn bad_cells_become_nan() {
        let r = parse_table("temps,Vin,Vout\n0,abc,1\n0.1,,2\n").unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.input_voltage[0].is_nan());
        assert!(r.input_voltage[1].is_nan());
        assert_eq!(r.output_voltage, vec![1.0, 2.0]);
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let r = parse_table("temps,Vin,Vout\r\n0,1,2\r\n\r\n1,2,3\r\n").unwrap();
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn empty_text_has_no_columns() {
        let err = parse_table("").unwrap_err();
        assert!(matches!(err, IngestError::NoColumns));
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse_table("time,Vin,Vout\n0,0,0\n").unwrap_err();
        assert_eq!(err.to_string(), "missing column 'temps'");
    }

    #[test]
    fn truncated_final_row_is_padded_with_nan() {
        let r = parse_table("temps,Vin,Vout\n0,0,0\n0.0001,0.157,0.0001\n0.0002,0.31\n").unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r.time, vec![0.0, 0.0001, 0.0002]);
        assert_eq!(r.input_voltage[2], 0.31);
        assert!(r.output_voltage[2].is_nan());
        assert_eq!(r.output_voltage[1], 0.0001);
    }

    #[test]
    fn short_row_keeps_later_rows() {
        let r = parse_table("temps,Vin,Vout\n0\n1,2,3\n").unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.input_voltage[0].is_nan());
        assert!(r.output_voltage[0].is_nan());
        assert_eq!(r.output_voltage[1], 3.0);
    }

    #[test]
    fn ragged_row_is_reported_with_line_number() {
        let err = parse_table("temps,Vin,Vout\n0,0,0\n1,2,3,4\n").unwrap_err();
        assert_eq!(err.to_string(), "expected 3 fields in line 3, saw 4");
    }

    #[test]
    fn missing_artifact_yields_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit_output.csv");
        let ingested = ingest(&path);
        assert!(ingested.result.is_empty());
        assert_eq!(ingested.warnings.len(), 1);
        assert!(ingested.warnings[0].starts_with("Output CSV not found after execution"));
        assert!(load_existing(&path).is_none());
    }

    #[test]
    fn unparsable_artifact_carries_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit_output.csv");
        std::fs::write(&path, "temps,Vin,Vout\n0,0,0,0\n").unwrap();
        let ingested = ingest(&path);
        assert!(ingested.result.is_empty());
        assert_eq!(
            ingested.warnings,
            vec!["Could not read engine output: expected 3 fields in line 2, saw 4".to_string()]
        );
    }

    #[test]
    fn non_utf8_artifact_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit_output.csv");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        let ingested = ingest(&path);
        assert!(ingested.result.is_empty());
        assert!(ingested.warnings[0].starts_with("Could not read engine output:"));
    }

    #[test]
    fn existing_artifact_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit_output.csv");
        std::fs::write(&path, "temps,Vin,Vout\n0,1,2\n").unwrap();
        let ingested = ingest(&path);
        assert!(ingested.warnings.is_empty());
        assert_eq!(ingested.result.len(), 1);
        assert_eq!(load_existing(&path).map(|r| r.len()), Some(1));
    }
}
