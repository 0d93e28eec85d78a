pub mod aggregate;
pub mod cli;
pub mod columns;
pub mod config;
pub mod country;
pub mod error;
pub mod impute;
pub mod ingest;
pub mod io_utils;
pub mod meta;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reshape;
pub mod shares;
pub mod table;
pub mod verify;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{BuildArgs, Cli, Commands, OutputFormat, ResolveArgs, SharesArgs, VerifyArgs},
    config::{OutputPaths, PipelineConfig},
    country::CountryCodes,
    pipeline::ReadOptions,
    table::Align,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("mortality_pipeline", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build(args) => handle_build(&args),
        Commands::Shares(args) => handle_shares(&args),
        Commands::Resolve(args) => handle_resolve(&args),
        Commands::Verify(args) => handle_verify(&args),
    }
}

/// Loads the configuration file (if any) and applies command-line overrides.
pub fn resolve_build_config(args: &BuildArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = &args.mortality {
        config.inputs.mortality = path.clone();
    }
    if let Some(path) = &args.population {
        config.inputs.population = path.clone();
    }
    if let Some(path) = &args.meta {
        config.inputs.meta = Some(path.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.outputs = OutputPaths::in_dir(dir);
    }
    if let Some(cutoff) = args.year_cutoff {
        config.year_cutoff = cutoff;
    }
    if let Some(skip) = args.population_skip_rows {
        config.population_skip_rows = skip;
    }
    Ok(config)
}

fn handle_build(args: &BuildArgs) -> Result<()> {
    let config = resolve_build_config(args)?;
    if args.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }
    debug!("Pipeline configuration: {config:?}");
    let read = ReadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    if let Some(delimiter) = args.delimiter {
        info!("Reading inputs with delimiter '{}'", printable_delimiter(delimiter));
    }
    let outputs = pipeline::execute(&config, read)?;
    info!(
        "Build complete: {} enriched row(s), {} summary row(s), {} country-year row(s)",
        outputs.enriched.len(),
        outputs.summary.len(),
        outputs.wide.len()
    );
    Ok(())
}

fn handle_shares(args: &SharesArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let records = ingest::read_mortality(&args.input, delimiter, encoding)?;
    let shares = shares::estimate_age_shares(&records)
        .with_context(|| format!("Estimating age shares from {:?}", args.input))?;
    match args.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&shares).context("Serializing age shares")?
            );
        }
        OutputFormat::Table => {
            let rows = shares
                .iter()
                .map(|s| {
                    vec![
                        s.age.to_string(),
                        s.sex.to_string(),
                        format!("{:.6}", s.fraction_of_total),
                    ]
                })
                .collect::<Vec<_>>();
            table::print_table(
                &["age", "sex", "fraction_of_total"],
                &rows,
                &[Align::Left, Align::Left, Align::Right],
            );
        }
    }
    info!("Estimated shares for {} age/sex group(s)", shares.len());
    Ok(())
}

fn handle_resolve(args: &ResolveArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let codes = CountryCodes::standard(&config.country_overrides);
    let rows = args
        .names
        .iter()
        .map(|name| {
            let (code, strategy) = match codes.lookup(name) {
                Some((code, strategy)) => (code, strategy.to_string()),
                None => {
                    warn!("Could not find alpha-3 code for country {name}");
                    (String::new(), String::from("-"))
                }
            };
            vec![name.clone(), code, strategy]
        })
        .collect::<Vec<_>>();
    table::print_table(
        &["country", "code", "strategy"],
        &rows,
        &[Align::Left, Align::Left, Align::Left],
    );
    Ok(())
}

fn handle_verify(args: &VerifyArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(None)?;
    let summary = output::read_summary(&args.summary, encoding)?;
    let wide = output::read_wide(&args.wide, encoding)?;
    let report = verify::check_round_trip(&summary, &wide, args.tolerance);
    if report.is_consistent() {
        info!(
            "✓ {:?} is a lossless reshape of {:?} ({} country-year(s) checked)",
            args.wide, args.summary, report.checked_keys
        );
        return Ok(());
    }
    for mismatch in &report.mismatches {
        eprintln!("{mismatch}");
    }
    Err(anyhow!(
        "{} mismatch(es) between {:?} and {:?}",
        report.mismatches.len(),
        args.summary,
        args.wide
    ))
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
