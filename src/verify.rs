//! Checks that the wide table is a lossless reshape of the per-sex summary.

use std::collections::BTreeMap;

use crate::{
    model::{Sex, SexSummary, WideRecord, undefined_if_zero},
    reshape::collapse_sexes,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundTripReport {
    pub summary_rows: usize,
    pub wide_rows: usize,
    pub checked_keys: usize,
    pub mismatches: Vec<String>,
}

impl RoundTripReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn close(left: Option<f64>, right: Option<f64>, tolerance: f64) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0),
        _ => false,
    }
}

fn sex_columns(row: &WideRecord, sex: Sex) -> (Option<f64>, Option<f64>, Option<f64>) {
    match sex {
        Sex::Female => (row.female_pop, row.female_rate, row.suicide_num_f),
        Sex::Male => (row.male_pop, row.male_rate, row.suicide_num_m),
    }
}

/// Compares combined totals and each sex's columns. `tolerance` is relative,
/// with an absolute floor of `tolerance` for values below 1.
pub fn check_round_trip(summary: &[SexSummary], wide: &[WideRecord], tolerance: f64) -> RoundTripReport {
    let mut report = RoundTripReport {
        summary_rows: summary.len(),
        wide_rows: wide.len(),
        ..RoundTripReport::default()
    };

    let wide_by_key = wide
        .iter()
        .map(|w| ((w.year, w.country.as_str()), w))
        .collect::<BTreeMap<_, _>>();
    if wide_by_key.len() != wide.len() {
        report
            .mismatches
            .push(format!("wide table repeats {} (year, country) key(s)", wide.len() - wide_by_key.len()));
    }

    let totals = collapse_sexes(summary);
    for total in &totals {
        report.checked_keys += 1;
        let label = format!("{} {}", total.country, total.year);
        let Some(row) = wide_by_key.get(&(total.year, total.country.as_str())) else {
            report.mismatches.push(format!("{label}: missing from wide table"));
            continue;
        };
        if row.code != total.code {
            report
                .mismatches
                .push(format!("{label}: code '{}' vs '{}'", total.code, row.code));
        }
        for (name, expected, actual) in [
            ("population", total.population, row.population),
            ("suicides_no", total.suicides_no, row.suicides_no),
            ("overall_rate", total.overall_rate, row.overall_rate),
        ] {
            if !close(expected, actual, tolerance) {
                report
                    .mismatches
                    .push(format!("{label}: {name} {expected:?} vs {actual:?}"));
            }
        }
    }
    if totals.len() != wide.len() {
        report.mismatches.push(format!(
            "summary collapses to {} country-year(s) but wide table has {}",
            totals.len(),
            wide.len()
        ));
    }

    for row in summary {
        let Some(wide_row) = wide_by_key.get(&(row.year, row.country.as_str())) else {
            continue;
        };
        let (population, rate, suicides) = sex_columns(wide_row, row.sex);
        let label = format!("{} {} {}", row.country, row.year, row.sex);
        if !close(undefined_if_zero(Some(row.population)), population, tolerance) {
            report
                .mismatches
                .push(format!("{label}: population {} vs {population:?}", row.population));
        }
        if !close(row.rate_per_100k, rate, tolerance) {
            report
                .mismatches
                .push(format!("{label}: rate {:?} vs {rate:?}", row.rate_per_100k));
        }
        if !close(Some(row.suicides_no), suicides, tolerance) {
            report
                .mismatches
                .push(format!("{label}: suicides {} vs {suicides:?}", row.suicides_no));
        }
    }
    report
}
