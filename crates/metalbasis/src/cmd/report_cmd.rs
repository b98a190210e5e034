//! Tax-year report command.
//!
//! Loads the ticker's backing table, rolls the lot through any prior
//! years, allocates the requested tax year, and renders the report as
//! labeled text or JSON.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use metalbasis_core::{carry_forward, Decimal, Lot, Report};
use metalbasis_loader::load_series;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Date formats accepted on the command line. The worksheets and the
/// published files use month/day/year.
const CLI_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"];

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable labeled text (default)
    #[default]
    Text,
    /// JSON for downstream tooling
    Json,
}

/// Calculate updated cost basis and expense-sale gain/loss for a
/// precious-metals ETF lot.
#[derive(Parser, Debug)]
#[command(
    name = "metalbasis",
    about = "Calculate updated cost basis and expense proceeds for precious metals ETFs"
)]
pub struct Args {
    /// ETF ticker.
    #[arg(short, long)]
    pub ticker: String,

    /// Date of purchase (m/d/y or ISO).
    #[arg(short, long, value_parser = parse_cli_date)]
    pub date_acquired: NaiveDate,

    /// Number of shares.
    #[arg(short = 'n', long)]
    pub shares: Decimal,

    /// Purchase price per share.
    #[arg(short, long)]
    pub price: Decimal,

    /// Tax year to report.
    #[arg(short, long)]
    pub year: i32,

    /// Date of sale (m/d/y or ISO), if the lot was sold during the year.
    #[arg(short = 's', long, value_parser = parse_cli_date)]
    pub date_sold: Option<NaiveDate>,

    /// Backing table CSV (defaults to <ticker>.csv, lowercased).
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    CLI_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("unrecognized date {s:?}, expected m/d/y or YYYY-MM-DD"))
}

/// The rendered result of one tax-year report.
#[derive(Debug, Serialize)]
pub struct TaxYearOutput {
    /// Ticker the report is for.
    pub ticker: String,
    /// Reported tax year.
    pub year: i32,
    /// File the backing table was read from.
    pub file: PathBuf,
    /// Original cost basis of the lot.
    pub purchase_basis: Decimal,
    /// Basis carried into the reported year after prior-year sales.
    pub starting_basis: Decimal,
    /// First date of the reported window.
    pub starting_date: NaiveDate,
    /// Last date of the reported window.
    pub ending_date: NaiveDate,
    /// The tax-year allocation, rounded for presentation.
    pub report: Report,
}

/// Run the report pipeline for parsed arguments.
pub fn run(args: &Args) -> Result<TaxYearOutput> {
    let path = args
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}.csv", args.ticker.to_lowercase())));

    let series = load_series(&args.ticker, &path)
        .with_context(|| format!("could not load backing table from {}", path.display()))?;
    info!(ticker = %args.ticker, file = %path.display(), rows = series.len(), "loaded backing table");

    let lot = Lot::new(&args.ticker, args.date_acquired, args.shares, args.price)?;
    let allocation = carry_forward(&lot, args.year, args.date_sold, &series)
        .with_context(|| format!("allocation failed for tax year {}", args.year))?;

    Ok(TaxYearOutput {
        ticker: args.ticker.clone(),
        year: args.year,
        file: path,
        purchase_basis: round_usd(lot.cost_basis()),
        starting_basis: round_usd(allocation.carried.basis),
        starting_date: allocation.window.start(),
        ending_date: allocation.window.end(),
        report: allocation.report.rounded(),
    })
}

fn round_usd(n: Decimal) -> Decimal {
    n.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Render the output in the requested format.
pub fn render(output: &TaxYearOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Using {}\n\
             Purchase cost basis: ${}\n\
             Tax year {} window: {} to {}\n\
             Starting cost basis: ${}\n\
             {}",
            output.file.display(),
            output.purchase_basis,
            output.year,
            output.starting_date,
            output.ending_date,
            output.starting_basis,
            output.report
        )),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("failed to serialize report")
        }
    }
}

/// Entry point shared with the wrapper binary.
pub fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(output) => match render(&output, args.format) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
