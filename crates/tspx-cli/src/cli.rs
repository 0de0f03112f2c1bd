use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tspx", author, version, about = "TSP formulation workbench", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write random GEO instances in TSPLIB form
    Generate {
        /// Node counts, comma separated (e.g. 5,10,15)
        #[arg(long, value_delimiter = ',', required = true)]
        sizes: Vec<usize>,
        /// Instances per node count
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Output directory; files are named `<n>_<k>.tsp`
        #[arg(long, default_value = "instances", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Seed for reproducible batches
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Solve instances with one or more formulations
    Solve {
        /// TSPLIB instance files
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        instances: Vec<PathBuf>,
        /// Formulations, comma separated (dfj, mtz, single-commodity,
        /// multi-commodity, log-lex); all when omitted
        #[arg(short, long, value_delimiter = ',')]
        formulations: Vec<String>,
        /// MILP backend (microlp, highs)
        #[arg(long)]
        backend: Option<String>,
        /// Seconds per solve
        #[arg(long)]
        time_limit: Option<f64>,
        /// Identity recorded in the solver log
        #[arg(long)]
        identity: Option<String>,
        /// Directory receiving results_no_relaxed.txt and results_relaxed.txt
        #[arg(long, value_hint = ValueHint::DirPath)]
        results_dir: Option<PathBuf>,
        /// Directory receiving per-run solver logs
        #[arg(long, value_hint = ValueHint::DirPath)]
        log_dir: Option<PathBuf>,
        /// Skip DFJ above this many nodes
        #[arg(long)]
        dfj_max_nodes: Option<usize>,
        /// TOML experiment file; flags override its values
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Output format for the run table
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Per-formulation totals from a result log
    Summarize {
        /// Result log file
        #[arg(value_hint = ValueHint::FilePath)]
        results: PathBuf,
        /// Which log layout the file uses
        #[arg(long, value_enum, default_value_t = LogKind::Integer)]
        kind: LogKind,
        /// Keep only these node counts
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<usize>,
        /// Output format for the summary
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Paired values of one column for two formulations, as CSV
    Compare {
        /// Result log file
        #[arg(value_hint = ValueHint::FilePath)]
        results: PathBuf,
        /// Which log layout the file uses
        #[arg(long, value_enum, default_value_t = LogKind::Integer)]
        kind: LogKind,
        /// Formulation on the x axis (log name, e.g. Log_Lex)
        #[arg(long)]
        x: String,
        /// Formulation on the y axis
        #[arg(long)]
        y: String,
        /// Column to compare (objective, bound, gap, runtime)
        #[arg(long, default_value = "runtime")]
        metric: String,
        /// Keep only these node counts
        #[arg(long, value_delimiter = ',')]
        nodes: Vec<usize>,
        /// Write the CSV here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogKind {
    /// results_no_relaxed.txt layout
    Integer,
    /// results_relaxed.txt layout
    Relaxed,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
