use clap::Parser;
use mbvst_cli::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Solve(args) => commands::solve::handle(args),
        Commands::Graph { command } => commands::graph::handle(command),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
