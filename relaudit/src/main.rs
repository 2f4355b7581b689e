// relaudit/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--format json` output on stdout stays parseable.
    // RUST_LOG takes precedence over -v.
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Audit {
            project_dir,
            format,
            out,
            concurrency,
            timeout_secs,
        } => {
            commands::audit::execute(project_dir, format, out, concurrency, timeout_secs).await?
        }
        Commands::Catalog { project_dir } => commands::catalog::execute(project_dir).await?,
    }

    Ok(())
}
