use std::collections::HashMap;

use mortality_pipeline::{
    impute::impute_populations,
    model::{AgeBand, MortalityRecord, PopulationTotal, Sex, SexSummary, rate_per_100k, round_to_cents},
    reshape::widen_by_sex,
    shares::estimate_age_shares,
    verify::check_round_trip,
};
use proptest::prelude::*;

const COUNTRIES: [(&str, &str); 5] = [
    ("Chile", "CHL"),
    ("Japan", "JPN"),
    ("Kenya", "KEN"),
    ("Norway", "NOR"),
    ("Peru", "PER"),
];

fn complete_block(country: usize, year: i32, populations: &[f64]) -> Vec<MortalityRecord> {
    Sex::ALL
        .into_iter()
        .flat_map(|sex| AgeBand::ALL.into_iter().map(move |age| (sex, age)))
        .zip(populations)
        .map(|((sex, age), population)| MortalityRecord {
            country: COUNTRIES[country].0.to_string(),
            year,
            age,
            sex,
            suicides_count: Some(1.0),
            population: Some(*population),
        })
        .collect()
}

fn summary_row(year: i32, sex: Sex, country: usize, suicides: f64, population: f64) -> SexSummary {
    SexSummary {
        year,
        sex,
        country: COUNTRIES[country].0.to_string(),
        suicides_no: suicides,
        population,
        rate_per_100k: rate_per_100k(suicides, population).map(round_to_cents),
        code: COUNTRIES[country].1.to_string(),
    }
}

fn populations() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(1.0f64..5_000_000.0, 12)
}

proptest! {
    #[test]
    fn shares_sum_to_one_for_complete_blocks(
        blocks in proptest::collection::btree_map((0usize..5, 1985i32..2015), populations(), 1..8)
    ) {
        let records = blocks
            .iter()
            .flat_map(|((country, year), pops)| complete_block(*country, *year, pops))
            .collect::<Vec<_>>();
        let shares = estimate_age_shares(&records).expect("complete blocks are consistent");
        prop_assert_eq!(shares.len(), 12);
        let total = shares.iter().map(|s| s.fraction_of_total).sum::<f64>();
        prop_assert!((total - 1.0).abs() < 1e-9, "shares sum to {}", total);
        prop_assert!(shares.iter().all(|s| (0.0..=1.0).contains(&s.fraction_of_total)));
    }

    #[test]
    fn imputed_population_is_share_times_total(
        pops in populations(),
        total in 1_000.0f64..1.0e9
    ) {
        let mut records = complete_block(0, 2000, &pops);
        records.extend(complete_block(4, 2000, &pops).into_iter().map(|mut r| {
            r.population = None;
            r
        }));
        let shares = estimate_age_shares(&records).expect("shares");
        let totals = vec![PopulationTotal {
            country: COUNTRIES[4].0.to_string(),
            year: 2000,
            total_population: Some(total),
        }];
        let (enriched, report) = impute_populations(&records, &shares, &totals).expect("impute");
        prop_assert_eq!(report.imputed, 12);
        let by_group = shares
            .iter()
            .map(|s| ((s.age, s.sex), s.fraction_of_total))
            .collect::<HashMap<_, _>>();
        for record in enriched.iter().filter(|r| r.country == COUNTRIES[4].0) {
            let expected = by_group[&(record.age, record.sex)] * total;
            let actual = record.population.expect("imputed");
            prop_assert!((actual - expected).abs() <= 1e-6 * expected.abs().max(1.0));
        }
    }

    #[test]
    fn widened_summary_round_trips(
        cells in proptest::collection::btree_map(
            (1985i32..2015, 0usize..5),
            (
                prop_oneof![Just(0.0f64), 1.0f64..2.0e7],
                prop_oneof![Just(0.0f64), 1.0f64..2.0e7],
                0u32..20_000,
                0u32..20_000,
            ),
            1..20,
        )
    ) {
        let summary = cells
            .iter()
            .flat_map(|((year, country), (pop_f, pop_m, s_f, s_m))| {
                [
                    summary_row(*year, Sex::Female, *country, f64::from(*s_f), *pop_f),
                    summary_row(*year, Sex::Male, *country, f64::from(*s_m), *pop_m),
                ]
            })
            .collect::<Vec<_>>();

        let wide = widen_by_sex(&summary).expect("one row per sex");
        prop_assert_eq!(wide.len(), cells.len());
        for row in &wide {
            if let (Some(f), Some(m), Some(total)) = (row.female_pop, row.male_pop, row.population) {
                prop_assert!((f + m - total).abs() <= 1e-9 * total);
                let suicides = row.suicides_no.expect("both sexes present");
                prop_assert_eq!(row.suicide_num_f.unwrap() + row.suicide_num_m.unwrap(), suicides);
                let rate = row.overall_rate.expect("positive population");
                prop_assert!((rate - suicides / total * 100_000.0).abs() <= 1e-9 * rate.abs().max(1.0));
            } else {
                prop_assert_eq!(row.population, None);
                prop_assert_eq!(row.overall_rate, None);
            }
            prop_assert!(row.overall_rate.is_none_or(f64::is_finite));
        }

        let report = check_round_trip(&summary, &wide, 1e-9);
        prop_assert!(report.is_consistent(), "{:?}", report.mismatches);
    }
}
