//! Record types flowing between pipeline stages.
//!
//! Each stage consumes a `Vec` of one record type and produces a new `Vec`
//! of the next; nothing is mutated in place after creation.

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Number of age bands reported per sex.
pub const AGE_BAND_COUNT: usize = 6;
/// Age bands × sexes: the number of records per complete (country, year).
pub const EXPECTED_GROUP_COUNT: usize = AGE_BAND_COUNT * 2;
/// Allowed deviation of the raw share sum from 1.0 before rescaling.
pub const SHARE_SUM_TOLERANCE: f64 = 0.01;
/// Years at or after this cutoff are sparse in the WHO data and are dropped.
pub const DEFAULT_YEAR_CUTOFF: i32 = 2015;
pub const RATE_SCALE: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    pub fn label(self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sex {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            _ => Err(PipelineError::parse("sex", value)),
        }
    }
}

/// The six WHO age bands.
///
/// Ordering follows the lexical order of the labels, so grouped output sorts
/// the same way a string column would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBand {
    #[serde(rename = "5-14 years")]
    Age5To14,
    #[serde(rename = "15-24 years")]
    Age15To24,
    #[serde(rename = "25-34 years")]
    Age25To34,
    #[serde(rename = "35-54 years")]
    Age35To54,
    #[serde(rename = "55-74 years")]
    Age55To74,
    #[serde(rename = "75+ years")]
    Age75Plus,
}

impl AgeBand {
    pub const ALL: [AgeBand; AGE_BAND_COUNT] = [
        AgeBand::Age5To14,
        AgeBand::Age15To24,
        AgeBand::Age25To34,
        AgeBand::Age35To54,
        AgeBand::Age55To74,
        AgeBand::Age75Plus,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Age5To14 => "5-14 years",
            AgeBand::Age15To24 => "15-24 years",
            AgeBand::Age25To34 => "25-34 years",
            AgeBand::Age35To54 => "35-54 years",
            AgeBand::Age55To74 => "55-74 years",
            AgeBand::Age75Plus => "75+ years",
        }
    }
}

impl Ord for AgeBand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label().cmp(other.label())
    }
}

impl PartialOrd for AgeBand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AgeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AgeBand {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        AgeBand::ALL
            .into_iter()
            .find(|band| band.label() == trimmed)
            .ok_or_else(|| PipelineError::parse("age band", value))
    }
}

/// One raw WHO row: a (country, year, age band, sex) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityRecord {
    pub country: String,
    pub year: i32,
    pub age: AgeBand,
    pub sex: Sex,
    pub suicides_count: Option<f64>,
    pub population: Option<f64>,
}

/// Dataset-wide average share of total population held by one age/sex group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgeShare {
    pub age: AgeBand,
    pub sex: Sex,
    pub fraction_of_total: f64,
}

/// Total population of a country in a year, as published in the reference
/// table. Empty cells stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationTotal {
    pub country: String,
    pub year: i32,
    pub total_population: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationSource {
    /// Present in the mortality data.
    Reported,
    /// Filled in as `share × total`.
    Imputed,
    /// Missing and no usable total was available.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub country: String,
    pub year: i32,
    pub age: AgeBand,
    pub sex: Sex,
    pub suicides_count: Option<f64>,
    pub population: Option<f64>,
    pub population_source: PopulationSource,
}

impl EnrichedRecord {
    pub fn is_complete(&self) -> bool {
        self.suicides_count.is_some() && self.population.is_some()
    }
}

/// Per (year, sex, country) totals across the six age bands.
#[derive(Debug, Clone, PartialEq)]
pub struct SexSummary {
    pub year: i32,
    pub sex: Sex,
    pub country: String,
    pub suicides_no: f64,
    pub population: f64,
    /// `None` where the aggregated population is zero.
    pub rate_per_100k: Option<f64>,
    pub code: String,
}

/// One (year, country) row with the sexes spread across columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideRecord {
    pub year: i32,
    pub country: String,
    pub code: String,
    pub female_rate: Option<f64>,
    pub male_rate: Option<f64>,
    pub female_pop: Option<f64>,
    pub male_pop: Option<f64>,
    pub suicide_num_f: Option<f64>,
    pub suicide_num_m: Option<f64>,
    pub overall_rate: Option<f64>,
    pub population: Option<f64>,
    pub suicides_no: Option<f64>,
}

/// Both sexes folded together for one (year, country).
#[derive(Debug, Clone, PartialEq)]
pub struct CountryYearTotals {
    pub year: i32,
    pub country: String,
    pub code: String,
    pub population: Option<f64>,
    pub suicides_no: Option<f64>,
    pub overall_rate: Option<f64>,
}

/// `value / population × 100000`, or `None` when the population is not usable.
pub fn rate_per_100k(count: f64, population: f64) -> Option<f64> {
    if population == 0.0 || !population.is_finite() {
        None
    } else {
        Some(count / population * RATE_SCALE)
    }
}

/// Rounds to two decimals using the exact binary value, as `%.2f` does.
pub fn round_to_cents(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Zero is not a real population for a whole sex; treat it as missing.
pub fn undefined_if_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
