//! horseshoe - directory crawling with filters, and debt snowball projections.
//!
//! Usage:
//!   horseshoe crawl [PATH]              Report on a directory tree
//!   horseshoe crawl --mode delete-files Delete files passing the filters
//!   horseshoe snowball ACCOUNTS.json    Project a payoff schedule
//!   horseshoe --help                    Show help

mod cli;
mod settings;

use std::path::Path;
use std::thread;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use horseshoe_crawl::{CrawlReport, DirectoryCrawler, NoHooks, TraversalAction};
use horseshoe_finance::{CreditAccount, Money, PayoffProjection, SnowballConfig, project};

use cli::{Cli, Command, CrawlArgs, OutputFormat, SnowballArgs};
use settings::{CrawlSettings, Settings, SnowballSettings};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Command::Crawl(args) => run_crawl(settings.crawl, &args),
        Command::Snowball(args) => run_snowball(settings.snowball, &args),
    }
}

/// Log to stderr, filtered by `HORSESHOE_LOG` unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("HORSESHOE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Crawl a directory and print what happened.
fn run_crawl(settings: CrawlSettings, args: &CrawlArgs) -> Result<()> {
    let settings = settings.merge(args);
    let options = settings.to_options()?;
    let path = args.path.canonicalize().context("Invalid path")?;

    if args.format == OutputFormat::Text {
        eprintln!("Crawling {}...", path.display());
    }

    let crawler = DirectoryCrawler::new(options);
    let mut progress_rx = crawler.subscribe();
    let progress = thread::spawn(move || {
        while let Ok(progress) = progress_rx.blocking_recv() {
            debug!(
                items = progress.total_items(),
                files = progress.files_seen,
                directories = progress.directories_seen,
                deletions = progress.deletions,
                files_per_second = format!("{:.0}", progress.files_per_second()),
                "crawl progress"
            );
        }
    });

    let result = crawler.crawl(&path, &mut NoHooks);
    // Dropping the crawler closes the progress channel.
    drop(crawler);
    let _ = progress.join();
    let report = result.context("Crawl failed")?;

    match args.format {
        OutputFormat::Text => print_crawl_report(&report, &settings),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_crawl_report(report: &CrawlReport, settings: &CrawlSettings) {
    let dry_run = if settings.dry_run { " (dry run)" } else { "" };

    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", report.root.display());
    println!(" mode: {}{}", settings.mode, dry_run);
    println!("{}", "─".repeat(60));

    if let Some(summary) = report.summary() {
        println!("{summary}");
    } else {
        println!(
            " {} files, {} directories",
            report.files_visited, report.directories_visited
        );
    }

    if let Some(stats) = &report.statistics {
        let deleted: Vec<_> = stats
            .entries()
            .iter()
            .filter(|e| e.action.is_deletion())
            .collect();
        if !deleted.is_empty() {
            println!();
            println!(
                " {} ({}):",
                if settings.dry_run { "Would delete" } else { "Deleted" },
                format_size(report.bytes_deleted)
            );
            for entry in deleted {
                println!("   {}", entry.virtual_path);
            }
        }

        let failed = stats
            .entries()
            .iter()
            .filter(|e| e.action == TraversalAction::Failed)
            .count();
        if failed > 0 {
            println!();
            println!(" {failed} entries failed");
        }
    }

    if report.aborted {
        println!();
        println!(" Crawl aborted");
    }
    if report.has_warnings() {
        println!();
        println!(" {} warning(s) during crawl:", report.warnings.len());
        for warning in &report.warnings {
            println!("   {}", warning.message);
        }
    }

    println!();
    println!(" Finished in {:.2}s", report.duration.as_secs_f64());
}

/// Project a payoff schedule for the accounts in a JSON file.
fn run_snowball(settings: SnowballSettings, args: &SnowballArgs) -> Result<()> {
    let config = settings.merge(args).to_config()?;
    let accounts = load_accounts(&args.accounts)?;
    let projection = project(&accounts, &config).context("Projection failed")?;

    match args.format {
        OutputFormat::Text => print_projection(&projection, &config),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&projection)?),
    }

    Ok(())
}

fn load_accounts(path: &Path) -> Result<Vec<CreditAccount>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read accounts file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid accounts file {}", path.display()))
}

fn print_projection(projection: &PayoffProjection, config: &SnowballConfig) {
    println!();
    println!("{}", "─".repeat(70));
    println!(
        " Snowball payoff ({}, {}/month)",
        config.order, projection.monthly_budget
    );
    println!("{}", "─".repeat(70));
    println!();

    println!(
        " {:<20} {:>12} {:>10} {:>12} {:>12}",
        "Account", "Balance", "Paid off", "Interest", "Total paid"
    );
    for account in &projection.accounts {
        println!(
            " {:<20} {:>12} {:>10} {:>12} {:>12}",
            truncate(&account.name, 20),
            account.starting_balance,
            account.payoff_date.format("%Y-%m"),
            account.interest_paid,
            account.total_paid
        );
    }
    println!();

    println!(
        " {:>5} {:>10} {:>12} {:>12} {:>14}",
        "Month", "Date", "Paid", "Interest", "Remaining"
    );
    for month in &projection.months {
        let interest: Money =
            month.payments.iter().map(|p| p.interest).sum();
        println!(
            " {:>5} {:>10} {:>12} {:>12} {:>14}",
            month.month,
            month.date.format("%Y-%m"),
            month.total_payment(),
            interest,
            month.total_balance
        );
    }
    println!();

    match projection.payoff_date() {
        Some(date) => println!(
            " Debt free in {} months ({}), {} interest, {} paid in total",
            projection.months_to_payoff(),
            date.format("%B %Y"),
            projection.total_interest,
            projection.total_paid
        ),
        None => println!(" Nothing owed"),
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}
