//! Long ↔ wide restructuring of the per-sex summary.
//!
//! [`widen_by_sex`] spreads the two sex rows of each (year, country, code)
//! into parallel columns; [`collapse_sexes`] folds the long rows back into
//! combined totals. Both apply the same zero-population rule so they agree
//! row for row.

use std::collections::BTreeMap;

use itertools::Itertools;
use log::{debug, warn};

use crate::{
    error::{PipelineError, PipelineResult},
    model::{CountryYearTotals, Sex, SexSummary, WideRecord, rate_per_100k, undefined_if_zero},
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct SexColumns {
    rate: Option<f64>,
    population: Option<f64>,
    suicides: Option<f64>,
}

fn add(left: Option<f64>, right: Option<f64>) -> Option<f64> {
    Some(left? + right?)
}

pub fn widen_by_sex(summary: &[SexSummary]) -> PipelineResult<Vec<WideRecord>> {
    let mut groups: BTreeMap<(i32, &str, &str), [Option<SexColumns>; 2]> = BTreeMap::new();
    for row in summary {
        let slots = groups
            .entry((row.year, row.country.as_str(), row.code.as_str()))
            .or_default();
        let slot = &mut slots[row.sex as usize];
        if slot.is_some() {
            return Err(PipelineError::Data(format!(
                "duplicate {} row for {} {} ({})",
                row.sex, row.country, row.year, row.code
            )));
        }
        *slot = Some(SexColumns {
            rate: row.rate_per_100k,
            population: Some(row.population),
            suicides: Some(row.suicides_no),
        });
    }

    let mut gaps = 0usize;
    let wide = groups
        .into_iter()
        .map(|((year, country, code), [female, male])| {
            if female.is_none() || male.is_none() {
                gaps += 1;
                debug!("Missing sex counterpart for {country} {year}");
            }
            let female_pop = undefined_if_zero(female.and_then(|c| c.population));
            let male_pop = undefined_if_zero(male.and_then(|c| c.population));
            let suicide_num_f = female.and_then(|c| c.suicides);
            let suicide_num_m = male.and_then(|c| c.suicides);
            let population = add(female_pop, male_pop);
            let suicides_no = add(suicide_num_f, suicide_num_m);
            WideRecord {
                year,
                country: country.to_string(),
                code: code.to_string(),
                female_rate: female.and_then(|c| c.rate),
                male_rate: male.and_then(|c| c.rate),
                female_pop,
                male_pop,
                suicide_num_f,
                suicide_num_m,
                overall_rate: suicides_no.zip(population).and_then(|(s, p)| rate_per_100k(s, p)),
                population,
                suicides_no,
            }
        })
        .collect::<Vec<_>>();

    if gaps > 0 {
        warn!("{gaps} country-year(s) lack a male or female row; their combined columns are empty");
    }
    Ok(wide)
}

/// Sums both sexes per (year, country), taking the first code seen.
pub fn collapse_sexes(summary: &[SexSummary]) -> Vec<CountryYearTotals> {
    summary
        .iter()
        .sorted_by(|a, b| (a.year, &a.country, a.sex).cmp(&(b.year, &b.country, b.sex)))
        .chunk_by(|row| (row.year, row.country.clone()))
        .into_iter()
        .map(|((year, country), rows)| {
            let rows = rows.collect::<Vec<_>>();
            let code = rows.first().map(|r| r.code.clone()).unwrap_or_default();
            let complete = rows.len() == Sex::ALL.len();
            let population = rows
                .iter()
                .map(|r| undefined_if_zero(Some(r.population)))
                .try_fold(0.0, |acc, p| p.map(|p| acc + p))
                .filter(|_| complete);
            let suicides_no = Some(rows.iter().map(|r| r.suicides_no).sum::<f64>()).filter(|_| complete);
            CountryYearTotals {
                year,
                country,
                code,
                population,
                suicides_no,
                overall_rate: suicides_no.zip(population).and_then(|(s, p)| rate_per_100k(s, p)),
            }
        })
        .collect()
}
