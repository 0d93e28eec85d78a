//! Unpivots the wide population reference table (one column per year) into
//! one [`PopulationTotal`] per (country, year) cell.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::{
    error::{PipelineError, PipelineResult},
    ingest::parse_optional_number,
    model::PopulationTotal,
};

/// Raw reference table as read from disk, before any projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationReference {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub country_column: String,
    pub metadata_columns: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            country_column: "Country Name".to_string(),
            metadata_columns: vec![
                "Country Code".to_string(),
                "Indicator Name".to_string(),
                "Indicator Code".to_string(),
            ],
        }
    }
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*(\d{1,4})(?:\.0*)?\s*$").expect("valid year regex"))
}

fn is_unnamed(header: &str) -> bool {
    let trimmed = header.trim();
    trimmed.is_empty() || trimmed.starts_with("Unnamed:")
}

pub fn parse_year_header(header: &str) -> PipelineResult<i32> {
    year_pattern()
        .captures(header)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| PipelineError::parse("year column", header))
}

pub fn normalize_population(
    reference: &PopulationReference,
    options: &NormalizeOptions,
) -> PipelineResult<Vec<PopulationTotal>> {
    let country_idx = reference
        .headers
        .iter()
        .position(|h| h.trim() == options.country_column)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: options.country_column.clone(),
            table: "population reference".to_string(),
        })?;

    let mut year_columns = Vec::new();
    for (idx, header) in reference.headers.iter().enumerate() {
        if idx == country_idx
            || is_unnamed(header)
            || options.metadata_columns.iter().any(|m| m == header.trim())
        {
            continue;
        }
        year_columns.push((idx, parse_year_header(header)?));
    }
    debug!(
        "Unpivoting {} country row(s) over {} year column(s)",
        reference.rows.len(),
        year_columns.len()
    );

    let mut totals = Vec::with_capacity(reference.rows.len() * year_columns.len());
    for row in &reference.rows {
        let country = row.get(country_idx).map(|s| s.trim()).unwrap_or("");
        for (idx, year) in &year_columns {
            let raw = row.get(*idx).map(|s| s.as_str()).unwrap_or("");
            totals.push(PopulationTotal {
                country: country.to_string(),
                year: *year,
                total_population: parse_optional_number(raw, "total population")?,
            });
        }
    }
    Ok(totals)
}
