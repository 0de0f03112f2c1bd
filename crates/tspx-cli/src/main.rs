use clap::Parser;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

use tspx_cli::{Cli, Commands, Overrides};

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    let result = match cli.command {
        Commands::Generate {
            sizes,
            count,
            dir,
            seed,
        } => commands::generate::handle(&sizes, count, &dir, seed),
        Commands::Solve {
            instances,
            formulations,
            backend,
            time_limit,
            identity,
            results_dir,
            log_dir,
            dfj_max_nodes,
            config,
            format,
        } => commands::solve::handle(
            &instances,
            config.as_deref(),
            Overrides {
                identity,
                formulations,
                dfj_max_nodes,
                backend,
                time_limit,
                results_dir,
                log_dir,
            },
            format,
        ),
        Commands::Summarize {
            results,
            kind,
            nodes,
            format,
        } => commands::summarize::handle(&results, kind, &nodes, format),
        Commands::Compare {
            results,
            kind,
            x,
            y,
            metric,
            nodes,
            out,
        } => commands::compare::handle(&results, kind, &x, &y, &metric, &nodes, out.as_deref()),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
