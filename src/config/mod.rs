pub mod settings;

pub use settings::{AppSettings, DataSettings, DatabaseSettings, Settings};

use crate::domain::model::{current_year, AgeGroup, Filters, ALL};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dnm-dashboard")]
#[command(about = "Repair-order and UIO reporting dashboard")]
pub struct CliConfig {
    /// Optional TOML settings file; environment variables still win
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliConfig {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the web dashboard (default)
    Serve,
    /// Write the detail table for a filter selection to CSV
    Export {
        /// Output file; defaults to dnm_data_export_<timestamp>.csv
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Check that the database answers `SELECT 1`
    CheckDb,
    /// Print the effective settings with the password masked
    ShowConfig,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long, default_value = "0-10Y")]
    pub age_group: AgeGroup,

    #[arg(long, default_value = ALL)]
    pub mobis_code: String,

    #[arg(long, default_value = ALL)]
    pub holding: String,

    #[arg(long, default_value = ALL)]
    pub region: String,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters {
            year: args.year.unwrap_or_else(current_year),
            age_group: args.age_group,
            mobis_code: args.mobis_code,
            holding: args.holding,
            region: args.region,
        }
    }
}
