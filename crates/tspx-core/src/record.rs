//! Result records emitted once per solve.
//!
//! Two comma-separated line formats are produced, one per log:
//!
//! ```text
//! integer:  formulation,instance_name,node_count,status,objective,bound,gap,runtime
//! relaxed:  formulation,instance_name,node_count,relaxed_objective,relaxed_runtime
//! ```
//!
//! Values the solver could not report are written as `NaN`. Lines are CSV:
//! fields containing commas or quotes are quoted, and readers trim
//! whitespace around every field. [`record_reader`] is the one reader used
//! for single lines and whole log files alike.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;

use crate::{TspError, TspResult};

/// Termination state of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal
    Optimal,
    /// Wall-clock limit reached; incumbent and bound are the best known
    TimeLimit,
    /// Proven infeasible
    Infeasible,
    /// Objective unbounded
    Unbounded,
    /// Solver stopped without a definitive answer
    Unknown,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::TimeLimit => "time_limit",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::Unknown => "unknown",
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolveStatus {
    type Err = TspError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "optimal" => Ok(SolveStatus::Optimal),
            "time_limit" => Ok(SolveStatus::TimeLimit),
            "infeasible" => Ok(SolveStatus::Infeasible),
            "unbounded" => Ok(SolveStatus::Unbounded),
            "unknown" => Ok(SolveStatus::Unknown),
            other => Err(TspError::Parse(format!("unknown solve status '{other}'"))),
        }
    }
}

/// Outcome of the integer solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegerRecord {
    pub formulation: String,
    pub instance: String,
    pub node_count: usize,
    pub status: SolveStatus,
    pub objective: f64,
    pub bound: f64,
    pub gap: f64,
    /// Seconds
    pub runtime: f64,
}

impl IntegerRecord {
    pub const FIELDS: usize = 8;

    /// The record as one log line, without the trailing newline.
    pub fn to_line(&self) -> TspResult<String> {
        write_line(self)
    }
}

impl FromStr for IntegerRecord {
    type Err = TspError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        parse_line(line, Self::FIELDS)
    }
}

/// Outcome of the relaxed solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaxedRecord {
    pub formulation: String,
    pub instance: String,
    pub node_count: usize,
    pub objective: f64,
    /// Seconds
    pub runtime: f64,
}

impl RelaxedRecord {
    pub const FIELDS: usize = 5;

    /// The record as one log line, without the trailing newline.
    pub fn to_line(&self) -> TspResult<String> {
        write_line(self)
    }
}

impl FromStr for RelaxedRecord {
    type Err = TspError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        parse_line(line, Self::FIELDS)
    }
}

/// Headerless, whitespace-trimming CSV reader over result-log text.
pub fn record_reader<R: io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn write_line<T: Serialize>(record: &T) -> TspResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.serialize(record)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| TspError::Io(err.into_error()))?;
    let line = String::from_utf8(bytes).map_err(|err| TspError::Parse(err.to_string()))?;
    Ok(line.trim_end_matches('\n').to_string())
}

fn parse_line<T: DeserializeOwned>(line: &str, expected: usize) -> TspResult<T> {
    let mut reader = record_reader(line.as_bytes());
    let mut records = reader.records();
    let record = match (records.next(), records.next()) {
        (Some(record), None) => record?,
        _ => {
            return Err(TspError::Parse(format!(
                "expected one record, found '{}'",
                line.trim()
            )))
        }
    };
    if record.len() != expected {
        return Err(TspError::Parse(format!(
            "expected {expected} fields, found {} in '{}'",
            record.len(),
            line.trim()
        )));
    }
    record
        .deserialize(None)
        .map_err(|err| TspError::Parse(format!("invalid record '{}': {err}", line.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer() -> IntegerRecord {
        IntegerRecord {
            formulation: "MTZ".into(),
            instance: "instances/5_1.tsp".into(),
            node_count: 5,
            status: SolveStatus::Optimal,
            objective: 412.0,
            bound: 412.0,
            gap: 0.0,
            runtime: 0.25,
        }
    }

    #[test]
    fn integer_line_layout() {
        assert_eq!(
            integer().to_line().unwrap(),
            "MTZ,instances/5_1.tsp,5,optimal,412.0,412.0,0.0,0.25"
        );
    }

    #[test]
    fn integer_line_parses_back() {
        let parsed: IntegerRecord = integer().to_line().unwrap().parse().unwrap();
        assert_eq!(parsed, integer());
    }

    #[test]
    fn instance_name_with_comma_is_quoted() {
        let mut record = integer();
        record.instance = "runs/a,b.tsp".into();
        let line = record.to_line().unwrap();
        assert!(line.contains("\"runs/a,b.tsp\""));

        let parsed: IntegerRecord = line.parse().unwrap();
        assert_eq!(parsed.instance, "runs/a,b.tsp");
        assert_eq!(parsed.node_count, 5);
    }

    #[test]
    fn unquoted_extra_comma_is_rejected() {
        let line = "MTZ,runs/a,b.tsp,5,optimal,412,412,0,0.25";
        let err = line.parse::<IntegerRecord>().unwrap_err();
        assert!(err.to_string().contains("expected 8 fields, found 9"));
    }

    #[test]
    fn relaxed_line_tolerates_whitespace() {
        let parsed: RelaxedRecord = "Log_Lex,5_1.tsp,5,398.5, 0.013\n".parse().unwrap();
        assert_eq!(parsed.formulation, "Log_Lex");
        assert_eq!(parsed.objective, 398.5);
        assert_eq!(parsed.runtime, 0.013);
    }

    #[test]
    fn unknown_bound_round_trips_as_nan() {
        let mut record = integer();
        record.status = SolveStatus::TimeLimit;
        record.bound = f64::NAN;
        let line = record.to_line().unwrap();
        assert!(line.contains(",time_limit,412.0,NaN,"));
        let parsed: IntegerRecord = line.parse().unwrap();
        assert!(parsed.bound.is_nan());
        assert_eq!(parsed.status, SolveStatus::TimeLimit);
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!("DFJ,a,5,1.0".parse::<RelaxedRecord>().is_err());
        assert!("DFJ,a,5,optimal,1,1,0".parse::<IntegerRecord>().is_err());
        assert!("".parse::<RelaxedRecord>().is_err());
        assert!("DFJ,a,5,done,1,1,0,0.5".parse::<IntegerRecord>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SolveStatus::TimeLimit).unwrap();
        assert_eq!(json, "\"time_limit\"");
    }
}
