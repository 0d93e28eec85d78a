//! Column names shared by the readers and writers.
//!
//! Downstream visualization tooling reads these names verbatim, including the
//! comma inside [`RATE`].

pub const COUNTRY: &str = "country";
pub const YEAR: &str = "year";
pub const SEX: &str = "sex";
pub const AGE: &str = "age";
pub const SUICIDES: &str = "suicides_no";
pub const POPULATION: &str = "population";
pub const RATE: &str = "suicides per 100,000";
pub const CODE: &str = "code";

pub const FEMALE_RATE: &str = "female_rate";
pub const MALE_RATE: &str = "male_rate";
pub const FEMALE_POP: &str = "female_pop";
pub const MALE_POP: &str = "male_pop";
pub const SUICIDES_FEMALE: &str = "suicide_num_f";
pub const SUICIDES_MALE: &str = "suicide_num_m";
pub const OVERALL_RATE: &str = "overall_rate";

pub const ENRICHED_HEADERS: [&str; 6] = [COUNTRY, YEAR, SEX, AGE, SUICIDES, POPULATION];

pub const SUMMARY_HEADERS: [&str; 7] = [YEAR, SEX, COUNTRY, SUICIDES, POPULATION, RATE, CODE];

pub const WIDE_HEADERS: [&str; 12] = [
    FEMALE_RATE,
    MALE_RATE,
    FEMALE_POP,
    MALE_POP,
    SUICIDES_FEMALE,
    SUICIDES_MALE,
    YEAR,
    COUNTRY,
    CODE,
    OVERALL_RATE,
    POPULATION,
    SUICIDES,
];

/// Cell texts read back as missing values.
pub const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING_MARKERS.contains(&trimmed)
}
