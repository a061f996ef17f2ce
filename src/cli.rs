//! Command-line interface definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use horseshoe_core::CrawlMode;
use horseshoe_finance::{Money, SnowballOrder};

#[derive(Parser, Debug)]
#[command(
    name = "horseshoe",
    version,
    about = "Directory crawling with filters, plus a debt snowball payoff projector",
    long_about = "horseshoe walks directory trees to report on them or clean them up, \
                  and projects how long a set of credit balances takes to pay off.\n\n\
                  Defaults can be kept in a TOML settings file with [crawl] and \
                  [snowball] tables; command-line flags win over the file."
)]
pub struct Cli {
    /// Settings file (defaults to ./horseshoe.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Log debug output to stderr (otherwise HORSESHOE_LOG, default "warn")
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Crawl a directory, optionally deleting what passes the filters
    Crawl(CrawlArgs),

    /// Project a debt snowball payoff schedule
    Snowball(SnowballArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Directory to crawl
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// What to do with matching nodes: browse, delete-files, delete-contents, delete-all
    #[arg(short, long)]
    pub mode: Option<CrawlMode>,

    /// Report deletions without touching the filesystem
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only visit files matching this glob (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip files matching this glob (repeatable)
    #[arg(short = 'x', long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Only enter directories matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub include_dir: Vec<String>,

    /// Do not enter directories matching this glob (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude_dir: Vec<String>,

    /// Maximum directory depth to enter (root = 0)
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Ignore entries whose name starts with a dot
    #[arg(long)]
    pub no_hidden: bool,

    /// Report per-entry errors and keep going
    #[arg(short = 'k', long)]
    pub continue_on_error: bool,

    /// Move deleted items to the trash instead of removing them
    #[arg(long)]
    pub trash: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SnowballArgs {
    /// JSON file holding an array of accounts
    /// (`name`, `balance`, `apr`, `minimum_payment`)
    pub accounts: PathBuf,

    /// Extra amount paid each month on top of the minimums (e.g. "150" or "$1,000")
    #[arg(short, long, value_name = "AMOUNT")]
    pub extra: Option<Money>,

    /// Which account gets the snowball first: lowest-balance-first,
    /// highest-rate-first, highest-balance-first, as-listed
    #[arg(short, long)]
    pub order: Option<SnowballOrder>,

    /// Give up after this many months
    #[arg(long)]
    pub max_months: Option<u32>,

    /// First payment month (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Drop a retired account's minimum from the monthly budget
    #[arg(long)]
    pub no_roll_over: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
