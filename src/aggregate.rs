//! Collapses enriched records across age bands into one row per
//! (year, sex, country) with a rate per 100,000 and an alpha-3 code.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::{
    country::{CachedResolver, CountryResolver},
    model::{EnrichedRecord, Sex, SexSummary, rate_per_100k, round_to_cents},
};

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Years at or after this value are dropped.
    pub year_cutoff: i32,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            year_cutoff: crate::model::DEFAULT_YEAR_CUTOFF,
        }
    }
}

pub fn summarize_by_sex<R: CountryResolver + ?Sized>(
    records: &[EnrichedRecord],
    resolver: &R,
    options: &AggregateOptions,
) -> Vec<SexSummary> {
    let complete = records.iter().filter(|r| r.is_complete()).collect::<Vec<_>>();
    let dropped = records.len() - complete.len();
    if dropped > 0 {
        debug!("Excluding {dropped} record(s) with missing suicide count or population");
    }

    let mut groups: BTreeMap<(i32, Sex, &str), (f64, f64)> = BTreeMap::new();
    for record in complete {
        let (Some(suicides), Some(population)) = (record.suicides_count, record.population) else {
            continue;
        };
        let slot = groups
            .entry((record.year, record.sex, record.country.as_str()))
            .or_insert((0.0, 0.0));
        slot.0 += suicides;
        slot.1 += population;
    }

    let resolver = CachedResolver::new(resolver);
    let mut zero_population = 0usize;
    let summaries = groups
        .into_iter()
        .filter(|((year, _, _), _)| *year < options.year_cutoff)
        .map(|((year, sex, country), (suicides_no, population))| {
            let rate = rate_per_100k(suicides_no, population).map(round_to_cents);
            if rate.is_none() {
                zero_population += 1;
            }
            SexSummary {
                year,
                sex,
                country: country.to_string(),
                suicides_no,
                population,
                rate_per_100k: rate,
                code: resolver.resolve(country),
            }
        })
        .collect::<Vec<_>>();

    if zero_population > 0 {
        warn!("{zero_population} sex group(s) have zero population; their rate is left undefined");
    }
    debug!(
        "Summarized {} sex group(s) across {} distinct countr(ies)",
        summaries.len(),
        resolver.lookups()
    );
    summaries
}
