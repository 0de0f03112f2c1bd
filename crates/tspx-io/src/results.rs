//! Result-log aggregation
//!
//! Reads the integer and relaxed result logs, groups rows by formulation and
//! derives the figures used to compare formulations: mean runtime per node
//! count and paired metric values for two formulations.

use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use tspx_core::record::record_reader;
use tspx_core::{IntegerRecord, RelaxedRecord, SolveStatus};

/// Columns that can be compared across formulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Objective,
    Bound,
    Gap,
    Runtime,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Objective => "objective",
            Metric::Bound => "bound",
            Metric::Gap => "gap",
            Metric::Runtime => "runtime",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "objective" | "obj" => Ok(Metric::Objective),
            "bound" => Ok(Metric::Bound),
            "gap" => Ok(Metric::Gap),
            "runtime" | "time" => Ok(Metric::Runtime),
            other => Err(anyhow!(
                "unknown metric '{other}'; supported values: objective, bound, gap, runtime"
            )),
        }
    }
}

/// Common view over both record kinds.
pub trait ResultRow {
    fn formulation(&self) -> &str;
    fn instance(&self) -> &str;
    fn node_count(&self) -> usize;
    /// `None` when the row kind has no such column.
    fn metric(&self, metric: Metric) -> Option<f64>;

    fn runtime(&self) -> f64 {
        self.metric(Metric::Runtime).unwrap_or(f64::NAN)
    }

    fn status(&self) -> Option<SolveStatus> {
        None
    }
}

impl ResultRow for IntegerRecord {
    fn formulation(&self) -> &str {
        &self.formulation
    }

    fn instance(&self) -> &str {
        &self.instance
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        Some(match metric {
            Metric::Objective => self.objective,
            Metric::Bound => self.bound,
            Metric::Gap => self.gap,
            Metric::Runtime => self.runtime,
        })
    }

    fn status(&self) -> Option<SolveStatus> {
        Some(self.status)
    }
}

impl ResultRow for RelaxedRecord {
    fn formulation(&self) -> &str {
        &self.formulation
    }

    fn instance(&self) -> &str {
        &self.instance
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Objective => Some(self.objective),
            Metric::Runtime => Some(self.runtime),
            Metric::Bound | Metric::Gap => None,
        }
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)
        .with_context(|| format!("opening result log {}", path.display()))?;
    let mut reader = record_reader(file);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("{}: row {}", path.display(), i + 1)))
        .collect()
}

/// Read an integer result log.
pub fn read_integer_records(path: &Path) -> Result<Vec<IntegerRecord>> {
    read_records(path)
}

/// Read a relaxed result log.
pub fn read_relaxed_records(path: &Path) -> Result<Vec<RelaxedRecord>> {
    read_records(path)
}

/// Rows grouped by formulation name, in name order.
pub fn records_by_formulation<R: ResultRow + Clone>(rows: &[R]) -> BTreeMap<String, Vec<R>> {
    let mut groups: BTreeMap<String, Vec<R>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.formulation().to_string())
            .or_default()
            .push(row.clone());
    }
    groups
}

/// Mean runtime over the rows with `node_count` nodes; `None` without rows.
pub fn average_runtime<R: ResultRow>(rows: &[R], node_count: usize) -> Option<f64> {
    let times: Vec<f64> = rows
        .iter()
        .filter(|r| r.node_count() == node_count)
        .map(|r| r.runtime())
        .collect();
    if times.is_empty() {
        return None;
    }
    Some(times.iter().sum::<f64>() / times.len() as f64)
}

/// One instance measured by two formulations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub node_count: usize,
    pub instance: String,
    pub x: f64,
    pub y: f64,
}

/// Pair `metric` of formulation `x` with formulation `y` per instance.
///
/// Only node counts in `node_counts` are kept (all when empty). Repeated
/// runs of an instance are paired in log order.
pub fn comparison_points<R: ResultRow>(
    rows: &[R],
    x: &str,
    y: &str,
    metric: Metric,
    node_counts: &[usize],
) -> Result<Vec<ComparisonPoint>> {
    let wanted = |r: &&R| node_counts.is_empty() || node_counts.contains(&r.node_count());
    let mut by_instance: BTreeMap<(usize, &str), (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows.iter().filter(wanted) {
        let side = if row.formulation() == x {
            0
        } else if row.formulation() == y {
            1
        } else {
            continue;
        };
        let value = row
            .metric(metric)
            .ok_or_else(|| anyhow!("metric '{metric}' is not recorded in this log"))?;
        let entry = by_instance
            .entry((row.node_count(), row.instance()))
            .or_default();
        if side == 0 {
            entry.0.push(value);
        } else {
            entry.1.push(value);
        }
    }

    let mut points = Vec::new();
    for ((node_count, instance), (xs, ys)) in by_instance {
        for (xv, yv) in xs.into_iter().zip(ys) {
            points.push(ComparisonPoint {
                node_count,
                instance: instance.to_string(),
                x: xv,
                y: yv,
            });
        }
    }
    Ok(points)
}

/// Per formulation and node count totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub formulation: String,
    pub node_count: usize,
    pub runs: usize,
    /// Runs that ended `optimal`; `None` for relaxed logs
    pub optimal: Option<usize>,
    pub mean_runtime: f64,
    pub mean_objective: f64,
}

/// Summaries sorted by formulation, then node count.
pub fn summarize<R: ResultRow + Clone>(rows: &[R]) -> Vec<SummaryRow> {
    let mut out = Vec::new();
    for (formulation, group) in records_by_formulation(rows) {
        let mut by_nodes: BTreeMap<usize, Vec<R>> = BTreeMap::new();
        for row in group {
            by_nodes.entry(row.node_count()).or_default().push(row);
        }
        for (node_count, members) in by_nodes {
            let runs = members.len();
            let optimal = members
                .iter()
                .map(|r| r.status())
                .collect::<Option<Vec<_>>>()
                .map(|s| s.iter().filter(|s| s.is_optimal()).count());
            let objective = members
                .iter()
                .filter_map(|r| r.metric(Metric::Objective))
                .sum::<f64>()
                / runs as f64;
            out.push(SummaryRow {
                formulation: formulation.clone(),
                node_count,
                runs,
                optimal,
                mean_runtime: average_runtime(&members, node_count).unwrap_or(f64::NAN),
                mean_objective: objective,
            });
        }
    }
    out
}
