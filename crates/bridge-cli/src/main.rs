mod cmd;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bridge",
    about = "Serve server-driven SPA views and inspect their asset configuration",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Production bundle directory (overrides the config file)
    #[arg(long, global = true, env = "BRIDGE_BUNDLE_DIR")]
    bundle_dir: Option<PathBuf>,

    /// Dev server origin (overrides the config file)
    #[arg(long, global = true, env = "BRIDGE_DEV_SERVER_URL")]
    dev_server_url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,
        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },

    /// Print the script and style URLs the bootstrap page would load
    Assets,

    /// Validate the configuration, manifest and bootstrap template
    Check,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let overrides = settings::Overrides {
        bundle_dir: cli.bundle_dir,
        dev_server_url: cli.dev_server_url,
    };

    let result = settings::load(cli.config.as_deref(), overrides).and_then(|config| {
        match cli.command {
            Commands::Serve { port, no_open } => cmd::serve::run(config, port, no_open),
            Commands::Assets => cmd::assets::run(&config, cli.json),
            Commands::Check => cmd::check::run(&config, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
