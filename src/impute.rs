//! Fills missing per-group populations as `share × total population`.
//!
//! Reported populations are never overwritten. Records whose (country, year)
//! has no usable total keep a missing population; the aggregator drops them
//! later instead of guessing.

use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    error::{PipelineError, PipelineResult},
    model::{
        AgeBand, AgeShare, EXPECTED_GROUP_COUNT, EnrichedRecord, MortalityRecord, PopulationSource,
        PopulationTotal, Sex,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputationReport {
    pub reported: usize,
    pub imputed: usize,
    pub unavailable: usize,
}

fn share_lookup(shares: &[AgeShare]) -> PipelineResult<HashMap<(AgeBand, Sex), f64>> {
    let mut lookup = HashMap::with_capacity(EXPECTED_GROUP_COUNT);
    for share in shares {
        if lookup
            .insert((share.age, share.sex), share.fraction_of_total)
            .is_some()
        {
            return Err(PipelineError::Shape(format!(
                "age share for {} {} listed more than once",
                share.age, share.sex
            )));
        }
    }
    if lookup.len() != EXPECTED_GROUP_COUNT {
        return Err(PipelineError::Shape(format!(
            "{} age share(s) supplied, expected {EXPECTED_GROUP_COUNT}",
            lookup.len()
        )));
    }
    Ok(lookup)
}

fn total_lookup(totals: &[PopulationTotal]) -> PipelineResult<HashMap<(&str, i32), f64>> {
    let mut lookup: HashMap<(&str, i32), f64> = HashMap::with_capacity(totals.len());
    let mut unusable = 0usize;
    for total in totals {
        let Some(value) = total.total_population else {
            continue;
        };
        if value.is_nan() || value <= 0.0 {
            unusable += 1;
            continue;
        }
        let key = (total.country.as_str(), total.year);
        match lookup.get(&key) {
            Some(existing) if *existing != value => {
                return Err(PipelineError::Data(format!(
                    "conflicting total populations {existing} and {value} for {} {}",
                    total.country, total.year
                )));
            }
            Some(_) => {}
            None => {
                lookup.insert(key, value);
            }
        }
    }
    if unusable > 0 {
        warn!("Ignoring {unusable} non-positive total population value(s) in the reference table");
    }
    Ok(lookup)
}

pub fn impute_populations(
    records: &[MortalityRecord],
    shares: &[AgeShare],
    totals: &[PopulationTotal],
) -> PipelineResult<(Vec<EnrichedRecord>, ImputationReport)> {
    let shares = share_lookup(shares)?;
    let totals = total_lookup(totals)?;
    let mut report = ImputationReport::default();

    let enriched = records
        .iter()
        .map(|record| {
            let fraction = shares[&(record.age, record.sex)];
            let (population, population_source) = match record.population {
                Some(reported) => {
                    report.reported += 1;
                    (Some(reported), PopulationSource::Reported)
                }
                None => match totals.get(&(record.country.as_str(), record.year)) {
                    Some(total) => {
                        report.imputed += 1;
                        (Some(fraction * total), PopulationSource::Imputed)
                    }
                    None => {
                        report.unavailable += 1;
                        (None, PopulationSource::Unavailable)
                    }
                },
            };
            EnrichedRecord {
                country: record.country.clone(),
                year: record.year,
                age: record.age,
                sex: record.sex,
                suicides_count: record.suicides_count,
                population,
                population_source,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "Imputation: {} reported, {} imputed, {} unavailable",
        report.reported, report.imputed, report.unavailable
    );
    Ok((enriched, report))
}
