// relaudit/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "relaudit")]
#[command(about = "Referential integrity and normalization auditor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// -v for progress logs, -vv for every SQL statement
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🔎 Audits referential integrity and functional dependencies
    Audit {
        /// Project directory (contains relaudit.yaml)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also write the report as a JSON artifact
        #[arg(long)]
        out: Option<PathBuf>,

        /// Checks in flight at once (overrides the project setting)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Run-level timeout in seconds (overrides the project setting)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// 📚 Lists tables, keys and the foreign-key edges that would be checked
    Catalog {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}
