use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinbani::core::log::init_logging;
use std::time::Duration;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display current prices
    Prices,
    /// Display current prices periodically until interrupted
    Watch {
        /// Seconds between queries
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match cli.command {
        Some(Commands::Setup) => coinbani::cli::setup::setup(),
        Some(Commands::Prices) => {
            coinbani::run_command(coinbani::AppCommand::Prices, config_path).await
        }
        Some(Commands::Watch { interval }) => {
            let every = Duration::from_secs(interval);
            coinbani::run_command(coinbani::AppCommand::Watch { every }, config_path).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
