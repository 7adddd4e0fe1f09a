use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use ival::core::log::init_logging;

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

impl From<Commands> for ival::AppCommand {
    fn from(cmd: Commands) -> ival::AppCommand {
        match cmd {
            Commands::Screen { universe } => ival::AppCommand::Screen { universe },
            Commands::Score { symbol } => ival::AppCommand::Score { symbol },
            Commands::History { clear } => ival::AppCommand::History { clear },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Screen a configured universe of tickers and rank them by rating
    Screen {
        /// Name of the universe from the configuration file
        universe: String,
    },
    /// Score a single company and show the full ratio breakdown
    Score {
        /// Ticker symbol, e.g. AAPL
        symbol: String,
    },
    /// Show past evaluations
    History {
        /// Delete all recorded evaluations
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => ival::cli::setup::setup(),
        Some(cmd) => ival::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
