use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile WHO mortality counts with population totals and derive suicide rate tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write enriched, per-sex and per-country-year tables
    Build(BuildArgs),
    /// Estimate the average population share of each age/sex group
    Shares(SharesArgs),
    /// Resolve country names to ISO 3166 alpha-3 codes
    Resolve(ResolveArgs),
    /// Check that a wide table is a lossless reshape of a per-sex summary
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// YAML configuration file (defaults apply to anything it omits)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// WHO mortality CSV (country, year, sex, age, suicides_no, population)
    #[arg(long)]
    pub mortality: Option<PathBuf>,
    /// Population reference table with one column per year
    #[arg(long)]
    pub population: Option<PathBuf>,
    /// Country meta-data table to clean alongside the run
    #[arg(long)]
    pub meta: Option<PathBuf>,
    /// Directory receiving all output tables
    #[arg(short, long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Drop years at or after this value from the summaries
    #[arg(long = "year-cutoff")]
    pub year_cutoff: Option<i32>,
    /// Preamble lines above the population table header
    #[arg(long = "population-skip-rows")]
    pub population_skip_rows: Option<usize>,
    /// CSV delimiter character for inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print the resolved configuration as YAML and exit without running
    #[arg(long = "print-config")]
    pub print_config: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct SharesArgs {
    /// WHO mortality CSV to estimate shares from
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Render as an aligned table or JSON
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Country names to resolve
    #[arg(required = true)]
    pub names: Vec<String>,
    /// Optional configuration providing extra country overrides
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Per-sex summary table written by `build`
    #[arg(long)]
    pub summary: PathBuf,
    /// Per-country-year wide table written by `build`
    #[arg(long)]
    pub wide: PathBuf,
    /// Relative tolerance when comparing numbers
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
