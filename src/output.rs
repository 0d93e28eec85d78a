//! Serialization of pipeline results to delimited text, and reading the
//! summary and wide tables back for verification.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::info;

use crate::{
    columns,
    error::{PipelineError, PipelineResult},
    ingest::{parse_optional_number, parse_year},
    io_utils::{self, StringTable},
    model::{EnrichedRecord, SexSummary, WideRecord},
};

/// Shortest text that reads back as the same `f64`; missing values are empty.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

pub fn enriched_table(records: &[EnrichedRecord]) -> StringTable {
    StringTable {
        headers: headers(&columns::ENRICHED_HEADERS),
        rows: records
            .iter()
            .map(|r| {
                vec![
                    r.country.clone(),
                    r.year.to_string(),
                    r.sex.to_string(),
                    r.age.to_string(),
                    format_number(r.suicides_count),
                    format_number(r.population),
                ]
            })
            .collect(),
    }
}

pub fn summary_table(summary: &[SexSummary]) -> StringTable {
    StringTable {
        headers: headers(&columns::SUMMARY_HEADERS),
        rows: summary
            .iter()
            .map(|s| {
                vec![
                    s.year.to_string(),
                    s.sex.to_string(),
                    s.country.clone(),
                    format_number(Some(s.suicides_no)),
                    format_number(Some(s.population)),
                    format_number(s.rate_per_100k),
                    s.code.clone(),
                ]
            })
            .collect(),
    }
}

pub fn wide_table(wide: &[WideRecord]) -> StringTable {
    StringTable {
        headers: headers(&columns::WIDE_HEADERS),
        rows: wide
            .iter()
            .map(|w| {
                vec![
                    format_number(w.female_rate),
                    format_number(w.male_rate),
                    format_number(w.female_pop),
                    format_number(w.male_pop),
                    format_number(w.suicide_num_f),
                    format_number(w.suicide_num_m),
                    w.year.to_string(),
                    w.country.clone(),
                    w.code.clone(),
                    format_number(w.overall_rate),
                    format_number(w.population),
                    format_number(w.suicides_no),
                ]
            })
            .collect(),
    }
}

pub fn write_stage(path: &Path, label: &str, table: &StringTable) -> Result<()> {
    info!("Saving {label} ({} row(s)) to {:?}", table.rows.len(), path);
    io_utils::write_table(path, table).with_context(|| format!("Writing {label} to {path:?}"))
}

struct Columns<'a> {
    table: &'a StringTable,
    name: &'static str,
}

impl<'a> Columns<'a> {
    fn index(&self, column: &str) -> PipelineResult<usize> {
        self.table
            .column_index(column)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: column.to_string(),
                table: self.name.to_string(),
            })
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.as_str()).unwrap_or("")
}

fn required_number(raw: &str, what: &str) -> PipelineResult<f64> {
    parse_optional_number(raw, what)?.ok_or_else(|| PipelineError::parse(what, raw))
}

pub fn parse_summary(table: &StringTable) -> PipelineResult<Vec<SexSummary>> {
    let cols = Columns {
        table,
        name: "summary",
    };
    let year = cols.index(columns::YEAR)?;
    let sex = cols.index(columns::SEX)?;
    let country = cols.index(columns::COUNTRY)?;
    let suicides = cols.index(columns::SUICIDES)?;
    let population = cols.index(columns::POPULATION)?;
    let rate = cols.index(columns::RATE)?;
    let code = cols.index(columns::CODE)?;

    table
        .rows
        .iter()
        .map(|row| {
            Ok(SexSummary {
                year: parse_year(cell(row, year))?,
                sex: cell(row, sex).parse()?,
                country: cell(row, country).to_string(),
                suicides_no: required_number(cell(row, suicides), columns::SUICIDES)?,
                population: required_number(cell(row, population), columns::POPULATION)?,
                rate_per_100k: parse_optional_number(cell(row, rate), columns::RATE)?,
                code: cell(row, code).to_string(),
            })
        })
        .collect()
}

pub fn parse_wide(table: &StringTable) -> PipelineResult<Vec<WideRecord>> {
    let cols = Columns { table, name: "wide" };
    let idx = columns::WIDE_HEADERS
        .iter()
        .map(|h| cols.index(h))
        .collect::<PipelineResult<Vec<_>>>()?;
    let number = |row: &[String], i: usize| parse_optional_number(cell(row, idx[i]), columns::WIDE_HEADERS[i]);

    table
        .rows
        .iter()
        .map(|row| {
            let row = row.as_slice();
            Ok(WideRecord {
                female_rate: number(row, 0)?,
                male_rate: number(row, 1)?,
                female_pop: number(row, 2)?,
                male_pop: number(row, 3)?,
                suicide_num_f: number(row, 4)?,
                suicide_num_m: number(row, 5)?,
                year: parse_year(cell(row, idx[6]))?,
                country: cell(row, idx[7]).to_string(),
                code: cell(row, idx[8]).to_string(),
                overall_rate: number(row, 9)?,
                population: number(row, 10)?,
                suicides_no: number(row, 11)?,
            })
        })
        .collect()
}

pub fn read_summary(path: &Path, encoding: &'static Encoding) -> Result<Vec<SexSummary>> {
    let delimiter = io_utils::resolve_input_delimiter(path, None);
    let table = io_utils::read_table(path, delimiter, encoding, 0)?;
    parse_summary(&table).with_context(|| format!("Parsing summary {path:?}"))
}

pub fn read_wide(path: &Path, encoding: &'static Encoding) -> Result<Vec<WideRecord>> {
    let delimiter = io_utils::resolve_input_delimiter(path, None);
    let table = io_utils::read_table(path, delimiter, encoding, 0)?;
    parse_wide(&table).with_context(|| format!("Parsing wide table {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;

    #[test]
    fn numbers_are_written_compactly() {
        assert_eq!(format_number(Some(289_700.0)), "289700");
        assert_eq!(format_number(Some(12.35)), "12.35");
        assert_eq!(format_number(None), "");
        assert_eq!(format_number(Some(f64::INFINITY)), "");
    }

    #[test]
    fn summary_round_trips_through_text() {
        let summary = vec![SexSummary {
            year: 1990,
            sex: Sex::Female,
            country: "Chile".to_string(),
            suicides_no: 10.0,
            population: 0.0,
            rate_per_100k: None,
            code: "CHL".to_string(),
        }];
        let table = summary_table(&summary);
        assert_eq!(table.headers[5], "suicides per 100,000");
        assert_eq!(parse_summary(&table).unwrap(), summary);
    }

    #[test]
    fn wide_round_trips_through_text() {
        let wide = vec![WideRecord {
            year: 1990,
            country: "Chile".to_string(),
            code: "CHL".to_string(),
            male_rate: Some(8.33),
            male_pop: Some(480_000.0),
            suicide_num_m: Some(40.0),
            ..WideRecord::default()
        }];
        let table = wide_table(&wide);
        assert_eq!(table.headers.len(), 12);
        assert_eq!(table.rows[0][0], "");
        assert_eq!(parse_wide(&table).unwrap(), wide);
    }

    #[test]
    fn summary_missing_rate_column_is_reported() {
        let mut table = summary_table(&[]);
        table.headers.retain(|h| h != columns::RATE);
        assert!(matches!(
            parse_summary(&table),
            Err(PipelineError::MissingColumn { .. })
        ));
    }
}
