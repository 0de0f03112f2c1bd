use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;

use tspx_cli::{LogKind, OutputFormat};
use tspx_io::{read_integer_records, read_relaxed_records, summarize, ResultRow, SummaryRow};

pub fn handle(results: &Path, kind: LogKind, nodes: &[usize], format: OutputFormat) -> Result<()> {
    let summary = match kind {
        LogKind::Integer => summarize(&filtered(read_integer_records(results)?, nodes)),
        LogKind::Relaxed => summarize(&filtered(read_relaxed_records(results)?, nodes)),
    };
    match format {
        OutputFormat::Plain => print_table(&summary),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), &summary)
                .map_err(|err| anyhow::anyhow!("serializing summary to JSON: {err}"))?;
            println!();
            Ok(())
        }
    }
}

fn filtered<R: ResultRow>(rows: Vec<R>, nodes: &[usize]) -> Vec<R> {
    if nodes.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|r| nodes.contains(&r.node_count()))
        .collect()
}

fn print_table(summary: &[SummaryRow]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "FORMULATION\tNODES\tRUNS\tOPTIMAL\tMEAN RUNTIME\tMEAN OBJECTIVE")?;
    for row in summary {
        let optimal = row
            .optimal
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.3}\t{:.2}",
            row.formulation, row.node_count, row.runs, optimal, row.mean_runtime, row.mean_objective
        )?;
    }
    writer.flush()?;
    Ok(())
}
