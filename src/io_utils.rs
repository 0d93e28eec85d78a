//! I/O utilities for reading and writing delimited tables.
//!
//! All file I/O in mortality-pipeline flows through this module:
//!
//! - **Delimiter resolution**: extension-based detection (`.tsv` → tab,
//!   anything else → comma) with manual override.
//! - **Decoding**: inputs are read wholesale and decoded through
//!   `encoding_rs` (UTF-8 by default, byte order marks stripped).
//! - **Preamble skipping**: reference tables such as the World Bank export
//!   carry a few lines of metadata above their header row.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Headers plus raw string cells, the shape every input is read into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StringTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| resolve_output_delimiter(path))
}

pub fn resolve_output_delimiter(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

/// Reads and decodes a whole file (or stdin for `-`), dropping the first
/// `skip_lines` lines.
pub fn read_text(path: &Path, encoding: &'static Encoding, skip_lines: usize) -> Result<String> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading stdin")?;
    } else {
        bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    }
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(anyhow!(
            "Failed to decode {path:?} with encoding {}",
            encoding.name()
        ));
    }
    if skip_lines == 0 {
        return Ok(text.into_owned());
    }
    Ok(text
        .split_inclusive('\n')
        .skip(skip_lines)
        .collect::<String>())
}

pub fn parse_table(text: &str, delimiter: u8) -> Result<StringTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .context("Reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(StringTable { headers, rows })
}

pub fn read_table(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    skip_lines: usize,
) -> Result<StringTable> {
    let text = read_text(path, encoding, skip_lines)?;
    parse_table(&text, delimiter).with_context(|| format!("Parsing {path:?}"))
}

pub fn open_csv_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = if is_dash(path) {
        Box::new(io::stdout())
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating output directory {parent:?}"))?;
        }
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ))
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn write_table(path: &Path, table: &StringTable) -> Result<()> {
    let mut writer = open_csv_writer(path, resolve_output_delimiter(path))?;
    writer
        .write_record(&table.headers)
        .with_context(|| format!("Writing headers to {path:?}"))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("Writing row to {path:?}"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing {path:?}"))?;
    Ok(())
}
