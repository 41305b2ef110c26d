mod commands;
mod config;
mod control;
mod platform;
mod storage;
mod transport;

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use config::Config;
use roundctl_core::gate::Mode;

#[derive(Parser)]
#[command(name = "roundctl", about = "Game control console for the numbers game backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Auto,
    Manual,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Auto => Mode::Auto,
            ModeArg::Manual => Mode::Manual,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live round timer and submit winning numbers
    Control {
        /// Backend API base URL. Overrides ROUNDCTL_API_URL.
        #[arg(long)]
        server: Option<String>,

        /// Commit policy at startup
        #[arg(long, value_enum, default_value = "manual")]
        mode: ModeArg,

        /// Re-sync the server clock every N seconds (0 disables)
        #[arg(long)]
        resync_secs: Option<u64>,
    },

    /// Fetch the server time and show the current round position
    Time {
        /// Backend API base URL. Overrides ROUNDCTL_API_URL.
        #[arg(long)]
        server: Option<String>,
    },

    /// Show the saved round counter and configuration
    Status,

    /// Inspect or overwrite the saved round counter
    Round {
        /// Store this round number
        #[arg(long, conflicts_with = "reset")]
        set: Option<u64>,

        /// Forget the saved round (next session starts at 1)
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing (controlled by RUST_LOG env var). Logs go to stderr
    // so the panel on stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (non-fatal if missing).
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    let mut config = Config::from_env();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Control {
            server,
            mode,
            resync_secs,
        } => {
            apply_server(&mut config, server);
            if let Some(secs) = resync_secs {
                config.resync_interval = (secs > 0).then(|| Duration::from_secs(secs));
            }
            commands::control::run_control(&config, mode.into()).await
        }
        Commands::Time { server } => {
            apply_server(&mut config, server);
            commands::time::run_time(&config).await
        }
        Commands::Status => commands::status::run_status(&config).await,
        Commands::Round { set, reset } => commands::round::run_round(&config, set, reset).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn apply_server(config: &mut Config, server: Option<String>) {
    if let Some(server) = server {
        config.api_url = server;
    }
}
