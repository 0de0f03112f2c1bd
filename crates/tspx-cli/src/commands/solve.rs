use anyhow::{bail, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabwriter::TabWriter;
use tracing::{error, info, warn};

use tspx_algo::formulation::{Formulation, FormulationKind, SolveReport};
use tspx_algo::result_log::run_log_path;
use tspx_algo::{BackendKind, ResultLog, SolverSession};
use tspx_core::Instance;
use tspx_io::parse_tsplib_file;
use tspx_cli::{ExperimentConfig, OutputFormat, Overrides};

#[derive(Debug, Serialize)]
struct RunRow {
    instance: String,
    formulation: &'static str,
    #[serde(flatten)]
    outcome: RunOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum RunOutcome {
    Solved { report: SolveReport },
    Skipped { reason: String },
    Failed { error: String },
}

/// Solve every instance with every selected formulation.
///
/// A failing run is reported and the batch moves on; the command fails at
/// the end when any run did.
pub fn handle(
    instances: &[PathBuf],
    config_path: Option<&Path>,
    overrides: Overrides,
    format: OutputFormat,
) -> Result<()> {
    let config = ExperimentConfig::resolve(config_path, overrides)?;
    let kinds = config.formulation_kinds()?;
    let backend = config.backend_kind()?;
    let log = ResultLog::in_dir(&config.output.results_dir);
    info!(
        backend = backend.as_str(),
        time_limit = config.solver.time_limit,
        runs = instances.len() * kinds.len(),
        "starting batch"
    );

    let mut rows = Vec::new();
    for path in instances {
        let instance = match parse_tsplib_file(path) {
            Ok(instance) => instance,
            Err(err) => {
                error!("skipping {}: {err:#}", path.display());
                for kind in &kinds {
                    rows.push(RunRow {
                        instance: path.display().to_string(),
                        formulation: kind.log_name(),
                        outcome: RunOutcome::Failed {
                            error: format!("{err:#}"),
                        },
                    });
                }
                continue;
            }
        };

        for &kind in &kinds {
            let outcome = if kind == FormulationKind::Dfj
                && instance.node_count() > config.dfj_max_nodes
            {
                warn!(
                    instance = instance.name(),
                    nodes = instance.node_count(),
                    cap = config.dfj_max_nodes,
                    "skipping DFJ"
                );
                RunOutcome::Skipped {
                    reason: format!(
                        "{} nodes exceed the DFJ cap of {}",
                        instance.node_count(),
                        config.dfj_max_nodes
                    ),
                }
            } else {
                match run_one(&instance, kind, backend, &config, &log) {
                    Ok(report) => RunOutcome::Solved { report },
                    Err(err) => {
                        error!("{} on {}: {err:#}", kind.log_name(), instance.name());
                        RunOutcome::Failed {
                            error: format!("{err:#}"),
                        }
                    }
                }
            };
            rows.push(RunRow {
                instance: instance.name().to_string(),
                formulation: kind.log_name(),
                outcome,
            });
        }
    }

    match format {
        OutputFormat::Plain => print_table(&rows)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(io::stdout(), &rows)
                .map_err(|err| anyhow::anyhow!("serializing runs to JSON: {err}"))?;
            println!();
        }
    }

    let failed = rows
        .iter()
        .filter(|r| matches!(r.outcome, RunOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        bail!("{failed} of {} runs failed", rows.len());
    }
    Ok(())
}

fn run_one(
    instance: &Instance,
    kind: FormulationKind,
    backend: BackendKind,
    config: &ExperimentConfig,
    log: &ResultLog,
) -> Result<SolveReport> {
    let log_file = run_log_path(
        &config.output.log_dir,
        kind.log_name(),
        instance.short_name(),
    )?;
    let session = SolverSession::open(backend.create(), config.session_config(log_file))?;
    let report = Formulation::new(instance, kind.strategy(), session)?.solve(log)?;
    Ok(report)
}

fn print_table(rows: &[RunRow]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "INSTANCE\tFORMULATION\tSTATUS\tOBJECTIVE\tGAP\tRELAXED\tRUNTIME"
    )?;
    for row in rows {
        match &row.outcome {
            RunOutcome::Solved { report } => writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{:.3}",
                row.instance,
                row.formulation,
                report.integer.status,
                report.integer.objective,
                report.integer.gap,
                report.relaxed.objective,
                report.integer.runtime
            )?,
            RunOutcome::Skipped { .. } => writeln!(
                writer,
                "{}\t{}\tskipped\t-\t-\t-\t-",
                row.instance, row.formulation
            )?,
            RunOutcome::Failed { .. } => writeln!(
                writer,
                "{}\t{}\tfailed\t-\t-\t-\t-",
                row.instance, row.formulation
            )?,
        }
    }
    writer.flush()?;
    Ok(())
}
