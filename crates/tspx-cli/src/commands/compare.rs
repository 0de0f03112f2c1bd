use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tracing::{info, warn};

use tspx_cli::LogKind;
use tspx_io::{
    comparison_points, read_integer_records, read_relaxed_records, ComparisonPoint, Metric,
};

/// Write `node_count,instance,x,y` rows for two formulations.
pub fn handle(
    results: &Path,
    kind: LogKind,
    x: &str,
    y: &str,
    metric: &str,
    nodes: &[usize],
    out: Option<&Path>,
) -> Result<()> {
    let metric: Metric = metric.parse()?;
    let points = match kind {
        LogKind::Integer => comparison_points(&read_integer_records(results)?, x, y, metric, nodes)?,
        LogKind::Relaxed => comparison_points(&read_relaxed_records(results)?, x, y, metric, nodes)?,
    };
    if points.is_empty() {
        warn!("no instance was solved by both {x} and {y}");
    }

    match out {
        Some(path) => {
            let writer = csv::Writer::from_path(path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_points(writer, &points)?;
            info!(points = points.len(), "wrote {}", path.display());
        }
        None => write_points(csv::Writer::from_writer(io::stdout()), &points)?,
    }
    Ok(())
}

fn write_points<W: io::Write>(mut writer: csv::Writer<W>, points: &[ComparisonPoint]) -> Result<()> {
    for point in points {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}
