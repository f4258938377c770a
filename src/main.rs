use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coindeck::config::AppConfig;
use coindeck::log::init_logging;
use coindeck::{cli, server};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard HTTP API
    Serve,
    /// Validate environment configuration
    Check,
    /// Fetch and display current exchange balances
    Balance,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Cli::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Some(Commands::Serve) => server::run(AppConfig::from_env()).await,
        Some(Commands::Check) => cli::check::run(),
        Some(Commands::Balance) => cli::balance::run(AppConfig::from_env()).await,
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
