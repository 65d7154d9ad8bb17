//! CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use parley_cli::{Cli, CliConfig, bootstrap, surface};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads its `env` fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr and stay quiet by default so they don't clobber the
    // prompt; RUST_LOG overrides.
    let default_filter = if cli.verbose { "parley=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig {
        no_voice: cli.no_voice,
        mute: cli.mute,
    };
    let ctx = bootstrap(&cli.settings(), config)?;

    surface::run(ctx).await
}
