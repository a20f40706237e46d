use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: SiteflowCommand,
}

#[derive(Parser)]
struct RunArgs {
    /// The name of the pipe to run
    pipe: String,

    /// The path to the configuration file [default: siteflow.yaml]
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ListArgs {
    /// The path to the configuration file [default: siteflow.yaml]
    #[arg(short, long)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum SiteflowCommand {
    /// Run a pipe from the configuration file
    Run(RunArgs),

    /// List the configured pipes and available stages
    List(ListArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        SiteflowCommand::Run(args) => {
            commands::run::run(&args).await?;
        }
        SiteflowCommand::List(args) => {
            commands::list::run(&args).await?;
        }
    }

    Ok(())
}
