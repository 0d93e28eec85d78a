//! Average population share of each age/sex group.
//!
//! Only (country, year) keys with a reported population contribute. The
//! twelve averages are checked against 1.0 before being rescaled onto it
//! exactly; a large deviation means the inputs are biased and the run stops.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::{
    error::{PipelineError, PipelineResult},
    model::{AgeBand, AgeShare, EXPECTED_GROUP_COUNT, MortalityRecord, SHARE_SUM_TOLERANCE, Sex},
};

pub fn estimate_age_shares(records: &[MortalityRecord]) -> PipelineResult<Vec<AgeShare>> {
    let known = records
        .iter()
        .filter_map(|r| r.population.map(|population| (r, population)))
        .collect::<Vec<_>>();
    if known.is_empty() {
        return Err(PipelineError::Shape(
            "no records with a known population to estimate age shares from".to_string(),
        ));
    }
    if known.len() % EXPECTED_GROUP_COUNT != 0 {
        return Err(PipelineError::Shape(format!(
            "{} records with known population is not a multiple of {EXPECTED_GROUP_COUNT}",
            known.len()
        )));
    }

    let mut totals: HashMap<(&str, i32), f64> = HashMap::new();
    for (record, population) in &known {
        *totals
            .entry((record.country.as_str(), record.year))
            .or_insert(0.0) += population;
    }
    for (record, _) in &known {
        let total = totals[&(record.country.as_str(), record.year)];
        if total.is_nan() || total <= 0.0 {
            return Err(PipelineError::Data(format!(
                "total population {total} for {} {} must be positive",
                record.country, record.year
            )));
        }
    }
    debug!(
        "Estimating age shares from {} record(s) across {} country-year(s)",
        known.len(),
        totals.len()
    );

    let mut groups: BTreeMap<(AgeBand, Sex), (f64, usize)> = BTreeMap::new();
    for (record, population) in &known {
        let fraction = population / totals[&(record.country.as_str(), record.year)];
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PipelineError::Range {
                country: record.country.clone(),
                year: record.year,
                fraction,
            });
        }
        let slot = groups.entry((record.age, record.sex)).or_insert((0.0, 0));
        slot.0 += fraction;
        slot.1 += 1;
    }
    if groups.len() != EXPECTED_GROUP_COUNT {
        return Err(PipelineError::Shape(format!(
            "found {} age/sex group(s), expected {EXPECTED_GROUP_COUNT}",
            groups.len()
        )));
    }

    let means = groups
        .into_iter()
        .map(|((age, sex), (sum, count))| (age, sex, sum / count as f64))
        .collect::<Vec<_>>();
    let total = means.iter().map(|(_, _, mean)| mean).sum::<f64>();
    let (lower, upper) = (1.0 - SHARE_SUM_TOLERANCE, 1.0 + SHARE_SUM_TOLERANCE);
    if !(lower..=upper).contains(&total) {
        return Err(PipelineError::Consistency {
            total,
            lower,
            upper,
        });
    }
    debug!("Raw age share sum {total:.6}, rescaling to 1.0");

    Ok(means
        .into_iter()
        .map(|(age, sex, mean)| AgeShare {
            age,
            sex,
            fraction_of_total: mean / total,
        })
        .collect())
}
