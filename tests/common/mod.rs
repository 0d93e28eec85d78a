#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const AGE_BANDS: [&str; 6] = [
    "5-14 years",
    "15-24 years",
    "25-34 years",
    "35-54 years",
    "55-74 years",
    "75+ years",
];
pub const SEXES: [&str; 2] = ["female", "male"];

/// Preamble lines above the header of a World Bank population download.
pub const WORLD_BANK_PREAMBLE: &str = "\"Data Source\",\"World Development Indicators\",\n\n\"Last Updated Date\",\"2019-01-30\",\n\n";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// One (country, year) block of twelve WHO rows, female first, ages in
/// reporting order. `population(idx)` and `suicides(idx)` receive the row's
/// position within the block.
pub fn who_block(
    country: &str,
    year: i32,
    suicides: impl Fn(usize) -> Option<f64>,
    population: impl Fn(usize) -> Option<f64>,
) -> String {
    let mut out = String::new();
    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    let quoted = if country.contains(',') {
        format!("\"{country}\"")
    } else {
        country.to_string()
    };
    let mut idx = 0;
    for sex in SEXES {
        for age in AGE_BANDS {
            writeln!(
                out,
                "{quoted},{year},{sex},{age},{},{}",
                cell(suicides(idx)),
                cell(population(idx))
            )
            .expect("format row");
            idx += 1;
        }
    }
    out
}

pub fn who_csv(blocks: &[String]) -> String {
    let mut out = String::from("country,year,sex,age,suicides_no,population\n");
    for block in blocks {
        out.push_str(block);
    }
    out
}

/// Group `idx` holds `(idx + 1) / 78` of the population, so twelve groups sum
/// to one.
pub fn proportional_population(total: f64) -> impl Fn(usize) -> Option<f64> {
    move |idx| Some(total * (idx as f64 + 1.0) / 78.0)
}

/// Population reference with the World Bank preamble, a header row carrying
/// `years` and a trailing unnamed column.
pub fn world_bank_csv(years: &[i32], rows: &[(&str, &str, &[&str])]) -> String {
    let mut out = String::from(WORLD_BANK_PREAMBLE);
    out.push_str("\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\"");
    for year in years {
        write!(out, ",\"{year}\"").expect("format header");
    }
    out.push_str(",\n");
    for (name, code, values) in rows {
        write!(out, "\"{name}\",\"{code}\",\"Population, total\",\"SP.POP.TOTL\"").expect("format row");
        for value in *values {
            write!(out, ",\"{value}\"").expect("format cell");
        }
        out.push_str(",\n");
    }
    out
}

/// Chile reports every population, Peru reports none, and the WHO spelling of
/// Iran needs the override table. Chile also carries a year past the cutoff.
pub fn standard_inputs(workspace: &TestWorkspace) -> (PathBuf, PathBuf) {
    let mortality = who_csv(&[
        who_block(
            "Chile",
            1990,
            |idx| Some(idx as f64 + 1.0),
            proportional_population(7_800_000.0),
        ),
        who_block("Peru", 1990, |idx| Some(2.0 * idx as f64), |_| None),
        who_block(
            "Iran (Islamic Rep of)",
            1990,
            |_| Some(3.0),
            proportional_population(15_600_000.0),
        ),
        who_block(
            "Chile",
            2016,
            |idx| Some(idx as f64),
            proportional_population(3_900_000.0),
        ),
    ]);
    let population = world_bank_csv(
        &[1990, 2016],
        &[
            ("Chile", "CHL", &["13100000", "17900000"]),
            ("Peru", "PER", &["21800000", "31800000"]),
            ("Iran, Islamic Rep.", "IRN", &["56400000", "79500000"]),
        ],
    );
    (
        workspace.write("who_suicide_statistics.csv", &mortality),
        workspace.write("total_pop.csv", &population),
    )
}
