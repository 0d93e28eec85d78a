//! Parsing of the raw mortality and population tables into typed records.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    columns,
    error::{PipelineError, PipelineResult},
    io_utils::{self, StringTable},
    model::MortalityRecord,
    normalize::PopulationReference,
};

pub fn parse_optional_number(raw: &str, what: &str) -> PipelineResult<Option<f64>> {
    if columns::is_missing(raw) {
        return Ok(None);
    }
    raw.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| PipelineError::parse(what, raw))
}

/// Accepts `1987` as well as `1987.0`, which float-typed exports produce.
pub fn parse_year(raw: &str) -> PipelineResult<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Ok(year);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && value.abs() < i32::MAX as f64 => Ok(value as i32),
        _ => Err(PipelineError::parse("year", raw)),
    }
}

fn require_column(table: &StringTable, column: &str, name: &str) -> PipelineResult<usize> {
    table
        .column_index(column)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: column.to_string(),
            table: name.to_string(),
        })
}

pub fn parse_mortality(table: &StringTable) -> PipelineResult<Vec<MortalityRecord>> {
    let table_name = "mortality data";
    let country = require_column(table, columns::COUNTRY, table_name)?;
    let year = require_column(table, columns::YEAR, table_name)?;
    let sex = require_column(table, columns::SEX, table_name)?;
    let age = require_column(table, columns::AGE, table_name)?;
    let suicides = require_column(table, columns::SUICIDES, table_name)?;
    let population = require_column(table, columns::POPULATION, table_name)?;

    let cell = |row: &[String], idx: usize| row.get(idx).cloned().unwrap_or_default();

    table
        .rows
        .iter()
        .map(|row| {
            let suicides_count = parse_optional_number(&cell(row, suicides), "suicide count")?;
            if suicides_count.is_some_and(|count| count < 0.0) {
                return Err(PipelineError::parse("suicide count", cell(row, suicides)));
            }
            Ok(MortalityRecord {
                country: cell(row, country).trim().to_string(),
                year: parse_year(&cell(row, year))?,
                age: cell(row, age).parse()?,
                sex: cell(row, sex).parse()?,
                suicides_count,
                population: parse_optional_number(&cell(row, population), "population")?,
            })
        })
        .collect()
}

pub fn read_mortality(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<MortalityRecord>> {
    let table = io_utils::read_table(path, delimiter, encoding, 0)?;
    let records =
        parse_mortality(&table).with_context(|| format!("Parsing mortality data {path:?}"))?;
    debug!("Read {} mortality record(s) from {:?}", records.len(), path);
    Ok(records)
}

pub fn read_population_reference(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    skip_lines: usize,
) -> Result<PopulationReference> {
    let table = io_utils::read_table(path, delimiter, encoding, skip_lines)
        .with_context(|| format!("Reading population reference {path:?}"))?;
    debug!(
        "Read {} population reference row(s) with {} column(s) from {:?}",
        table.rows.len(),
        table.headers.len(),
        path
    );
    Ok(PopulationReference {
        headers: table.headers,
        rows: table.rows,
    })
}
