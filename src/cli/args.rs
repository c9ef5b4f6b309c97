//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{cap::CapArgs, group::GroupArgs, revise::ReviseArgs, summary::SummaryArgs};

/// Die capability toolkit: Cp/Cpk analysis and what-if limit revision for
/// semiconductor test data
#[derive(Parser, Debug)]
#[command(name = "dct", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "auto")]
    pub format: OutputFormat,

    /// Analysis config file (YAML)
    #[arg(long, global = true, env = "DCT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `dct=debug`
    #[arg(long, global = true, env = "DCT_LOG", default_value = "warn")]
    pub log_level: String,

    /// Suppress status messages on stderr
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table for lists, YAML for single records
    #[default]
    Auto,
    Table,
    Csv,
    Json,
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capability report per test item
    Cap(CapArgs),

    /// Recompute fail rates against candidate limits
    Revise(ReviseArgs),

    /// Partition dies by header and die columns
    Group(GroupArgs),

    /// Bin, site, test time and retest summary
    Summary(SummaryArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Lot directories to load, merged in order
#[derive(clap::Args, Debug, Clone)]
pub struct InputArgs {
    /// Lot directories holding dies.csv, measurements.csv and tests.csv
    #[arg(required = true)]
    pub lots: Vec<PathBuf>,
}
