//! End-to-end run: estimate shares, normalize totals, impute, summarize by
//! sex, widen. [`run_pipeline`] is pure over in-memory inputs; [`execute`]
//! adds the file I/O around it and writes nothing until every stage passed.

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    aggregate::{AggregateOptions, summarize_by_sex},
    config::PipelineConfig,
    country::{CountryCodes, CountryResolver},
    error::PipelineResult,
    impute::{ImputationReport, impute_populations},
    ingest, io_utils, meta,
    model::{AgeShare, EnrichedRecord, MortalityRecord, PopulationTotal, SexSummary, WideRecord},
    normalize::{NormalizeOptions, PopulationReference, normalize_population},
    output,
    reshape::widen_by_sex,
    shares::estimate_age_shares,
};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub normalize: NormalizeOptions,
    pub aggregate: AggregateOptions,
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            aggregate: AggregateOptions {
                year_cutoff: config.year_cutoff,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub shares: Vec<AgeShare>,
    pub totals: Vec<PopulationTotal>,
    pub enriched: Vec<EnrichedRecord>,
    pub imputation: ImputationReport,
    pub summary: Vec<SexSummary>,
    pub wide: Vec<WideRecord>,
}

pub fn run_pipeline<R: CountryResolver + ?Sized>(
    mortality: &[MortalityRecord],
    reference: &PopulationReference,
    resolver: &R,
    options: &PipelineOptions,
) -> PipelineResult<PipelineOutputs> {
    let shares = estimate_age_shares(mortality)?;
    info!("Estimated {} age/sex share(s)", shares.len());

    let totals = normalize_population(reference, &options.normalize)?;
    info!("Normalized {} country-year population total(s)", totals.len());

    let (enriched, imputation) = impute_populations(mortality, &shares, &totals)?;
    info!(
        "Imputed {} population value(s); {} remain unavailable",
        imputation.imputed, imputation.unavailable
    );

    let summary = summarize_by_sex(&enriched, resolver, &options.aggregate);
    info!("Summarized into {} (year, sex, country) row(s)", summary.len());

    let wide = widen_by_sex(&summary)?;
    info!("Reshaped into {} (year, country) row(s)", wide.len());

    Ok(PipelineOutputs {
        shares,
        totals,
        enriched,
        imputation,
        summary,
        wide,
    })
}

/// Input parsing settings shared by every table read during a run.
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

pub fn execute(config: &PipelineConfig, read: ReadOptions) -> Result<PipelineOutputs> {
    let inputs = &config.inputs;
    info!("Reading mortality data from {:?}", inputs.mortality);
    let mortality = ingest::read_mortality(
        &inputs.mortality,
        io_utils::resolve_input_delimiter(&inputs.mortality, read.delimiter),
        read.encoding,
    )?;
    info!("Reading population reference from {:?}", inputs.population);
    let reference = ingest::read_population_reference(
        &inputs.population,
        io_utils::resolve_input_delimiter(&inputs.population, read.delimiter),
        read.encoding,
        config.population_skip_rows,
    )?;
    let cleaned_meta = match &inputs.meta {
        Some(path) => {
            info!("Reading meta data from {path:?}");
            let table = io_utils::read_table(
                path,
                io_utils::resolve_input_delimiter(path, read.delimiter),
                read.encoding,
                0,
            )?;
            Some(meta::clean_meta_data(&table))
        }
        None => None,
    };

    let resolver = CountryCodes::standard(&config.country_overrides);
    let outputs = run_pipeline(&mortality, &reference, &resolver, &PipelineOptions::from(config))
        .context("Processing data")?;

    let paths = &config.outputs;
    output::write_stage(&paths.enriched, "enriched data", &output::enriched_table(&outputs.enriched))?;
    if let Some(table) = &cleaned_meta {
        output::write_stage(&paths.meta, "cleaned meta data", table)?;
    }
    output::write_stage(&paths.summary, "per-sex summary", &output::summary_table(&outputs.summary))?;
    output::write_stage(&paths.wide, "per-country-year data", &output::wide_table(&outputs.wide))?;
    Ok(outputs)
}
