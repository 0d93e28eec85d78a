mod common;

use std::fs;

use assert_cmd::Command;
use mortality_pipeline::{
    config::{OutputPaths, PipelineConfig},
    io_utils, output,
};
use predicates::prelude::*;
use predicates::str::contains;

use common::{TestWorkspace, proportional_population, standard_inputs, who_block, who_csv};

fn binary() -> Command {
    Command::cargo_bin("mortality-pipeline").expect("binary exists")
}

#[test]
fn build_writes_all_output_tables() {
    let workspace = TestWorkspace::new();
    let (mortality, population) = standard_inputs(&workspace);
    let out_dir = workspace.path().join("processed");

    binary()
        .args([
            "build",
            "--mortality",
            mortality.to_str().unwrap(),
            "--population",
            population.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    let enriched = fs::read_to_string(out_dir.join("enriched_df.csv")).expect("read enriched");
    let mut lines = enriched.lines();
    assert_eq!(lines.next(), Some("country,year,sex,age,suicides_no,population"));
    assert_eq!(lines.count(), 48);

    let summary = fs::read_to_string(out_dir.join("choropleth_df.csv")).expect("read summary");
    assert_eq!(
        summary.lines().next(),
        Some("year,sex,country,suicides_no,population,\"suicides per 100,000\",code")
    );
    assert!(
        summary.lines().skip(1).all(|line| line.starts_with("1990,")),
        "years past the cutoff are dropped"
    );

    let summary = output::read_summary(&out_dir.join("choropleth_df.csv"), encoding_rs::UTF_8)
        .expect("parse summary");
    assert_eq!(summary.len(), 6);
    let codes = summary
        .iter()
        .map(|s| (s.sex.label(), s.code.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        codes,
        [
            ("female", "CHL"),
            ("female", "IRN"),
            ("female", "PER"),
            ("male", "CHL"),
            ("male", "IRN"),
            ("male", "PER"),
        ]
    );

    let wide = fs::read_to_string(out_dir.join("year_country_data.csv")).expect("read wide");
    assert_eq!(
        wide.lines().next(),
        Some(
            "female_rate,male_rate,female_pop,male_pop,suicide_num_f,suicide_num_m,\
             year,country,code,overall_rate,population,suicides_no"
        )
    );
    assert_eq!(wide.lines().count(), 4);
    assert!(!out_dir.join("cleaned_meta.csv").exists());
}

#[test]
fn build_reads_yaml_configuration_and_cleans_meta() {
    let workspace = TestWorkspace::new();
    let (mortality, population) = standard_inputs(&workspace);
    let meta = workspace.write(
        "meta.csv",
        "Country Code,Region,IncomeGroup,SpecialNotes,TableName,\n\
         CHL,Latin America & Caribbean,High income,,Chile,\n\
         PER,Latin America & Caribbean,Upper middle income,Note,Peru,\n",
    );
    let out_dir = workspace.path().join("configured");
    let config = workspace.write(
        "pipeline.yaml",
        &format!(
            "inputs:\n  mortality: {}\n  population: {}\n  meta: {}\n\
             outputs:\n  enriched: {}\n  summary: {}\n  wide: {}\n  meta: {}\n\
             year_cutoff: 2020\n",
            mortality.display(),
            population.display(),
            meta.display(),
            out_dir.join("enriched.csv").display(),
            out_dir.join("summary.csv").display(),
            out_dir.join("wide.csv").display(),
            out_dir.join("meta.csv").display(),
        ),
    );

    binary()
        .args(["build", "-c", config.to_str().unwrap()])
        .assert()
        .success();

    let summary = output::read_summary(&out_dir.join("summary.csv"), encoding_rs::UTF_8)
        .expect("parse summary");
    assert!(summary.iter().any(|s| s.year == 2016), "cutoff raised to 2020");

    let meta = io_utils::read_table(&out_dir.join("meta.csv"), b',', encoding_rs::UTF_8, 0)
        .expect("read cleaned meta");
    assert_eq!(meta.headers, ["code", "region", "income"]);
    assert_eq!(meta.rows.len(), 2);
    assert_eq!(meta.rows[1][2], "Upper middle income");
}

#[test]
fn build_rejects_unknown_configuration_keys() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("bad.yaml", "year_cutof: 2010\n");

    binary()
        .args(["build", "-c", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:"))
        .stderr(contains("configuration"));
}

#[test]
fn build_stops_before_writing_when_shares_are_inconsistent() {
    let workspace = TestWorkspace::new();
    let mut block = who_block("Chile", 1990, |_| Some(1.0), proportional_population(78_000.0));
    // Drop the last row: 11 known populations cannot cover the 12 groups.
    let trimmed = block.lines().take(11).collect::<Vec<_>>().join("\n");
    block = format!("{trimmed}\n");
    let mortality = workspace.write("who.csv", &who_csv(&[block]));
    let population = workspace.write("pop.csv", &common::world_bank_csv(&[1990], &[]));
    let out_dir = workspace.path().join("never");

    binary()
        .args([
            "build",
            "--mortality",
            mortality.to_str().unwrap(),
            "--population",
            population.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("shape error"));

    assert!(!out_dir.exists(), "nothing is persisted after a failed stage");
}

#[test]
fn shares_prints_json() {
    let workspace = TestWorkspace::new();
    let (mortality, _) = standard_inputs(&workspace);

    let assert = binary()
        .args(["shares", "-i", mortality.to_str().unwrap(), "--format", "json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let shares: Vec<serde_json::Value> = serde_json::from_str(&stdout).expect("parse json");
    assert_eq!(shares.len(), 12);
    assert_eq!(shares[0]["age"], "15-24 years");
    assert_eq!(shares[0]["sex"], "female");
    let total = shares
        .iter()
        .map(|s| s["fraction_of_total"].as_f64().expect("number"))
        .sum::<f64>();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn shares_prints_table_with_semicolon_delimiter() {
    let workspace = TestWorkspace::new();
    let mortality = who_csv(&[who_block(
        "Chile",
        1990,
        |_| Some(1.0),
        proportional_population(78_000.0),
    )])
    .replace(',', ";");
    let path = workspace.write("who.csv", &mortality);

    binary()
        .args(["shares", "-i", path.to_str().unwrap(), "--delimiter", ";"])
        .assert()
        .success()
        .stdout(contains("fraction_of_total"))
        .stdout(contains("75+ years"))
        .stdout(contains("0.153846"));
}

#[test]
fn resolve_reports_code_and_strategy() {
    binary()
        .args(["resolve", "Chile", "Iran (Islamic Rep of)", "Macau", "Atlantis"])
        .assert()
        .success()
        .stdout(contains("CHL"))
        .stdout(contains("exact"))
        .stdout(contains("IRN"))
        .stdout(contains("fuzzy"))
        .stdout(contains("MAC"))
        .stdout(contains("override"))
        .stdout(contains("Atlantis"));
}

#[test]
fn resolve_uses_configured_overrides() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("overrides.yaml", "country_overrides:\n  Atlantis: ATL\n");

    binary()
        .args(["resolve", "Atlantis", "-c", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("ATL"));
}

#[test]
fn verify_accepts_build_output() {
    let workspace = TestWorkspace::new();
    let (mortality, population) = standard_inputs(&workspace);
    let out_dir = workspace.path().join("processed");
    binary()
        .args([
            "build",
            "--mortality",
            mortality.to_str().unwrap(),
            "--population",
            population.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();

    binary()
        .args([
            "verify",
            "--summary",
            out_dir.join("choropleth_df.csv").to_str().unwrap(),
            "--wide",
            out_dir.join("year_country_data.csv").to_str().unwrap(),
        ])
        .assert()
        .success();
}

#[test]
fn verify_reports_tampered_totals() {
    let workspace = TestWorkspace::new();
    let summary = workspace.write(
        "summary.csv",
        "year,sex,country,suicides_no,population,\"suicides per 100,000\",code\n\
         1990,female,Chile,10,100000,10.0,CHL\n\
         1990,male,Chile,30,100000,30.0,CHL\n",
    );
    let wide = workspace.write(
        "wide.csv",
        "female_rate,male_rate,female_pop,male_pop,suicide_num_f,suicide_num_m,\
         year,country,code,overall_rate,population,suicides_no\n\
         10.0,30.0,100000,100000,10,30,1990,Chile,CHL,20.0,200000,41\n",
    );

    binary()
        .args([
            "verify",
            "--summary",
            summary.to_str().unwrap(),
            "--wide",
            wide.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("mismatch"));
}

#[test]
fn build_prints_resolved_configuration_without_running() {
    let workspace = TestWorkspace::new();
    let config = workspace.write("base.yaml", "year_cutoff: 2010\npopulation_skip_rows: 2\n");
    let out_dir = workspace.path().join("untouched");

    let assert = binary()
        .args([
            "build",
            "-c",
            config.to_str().unwrap(),
            "--year-cutoff",
            "2001",
            "-o",
            out_dir.to_str().unwrap(),
            "--print-config",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let printed = PipelineConfig::from_yaml(&stdout).expect("printed config parses");
    assert_eq!(printed.year_cutoff, 2001);
    assert_eq!(printed.population_skip_rows, 2);
    assert_eq!(printed.outputs, OutputPaths::in_dir(&out_dir));
    assert!(!out_dir.exists());
}

#[test]
fn resolve_warns_once_for_unknown_names() {
    let assert = binary()
        .env_remove("RUST_LOG")
        .args(["resolve", "Atlantis"])
        .assert()
        .success();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert_eq!(
        stderr
            .matches("Could not find alpha-3 code for country Atlantis")
            .count(),
        1
    );
}

#[test]
fn resolve_keeps_withdrawn_compound_names_historic() {
    binary()
        .args(["resolve", "Serbia and Montenegro", "Netherlands Antilles"])
        .assert()
        .success()
        .stdout(contains("SCG"))
        .stdout(contains("ANT"))
        .stdout(contains("historic"))
        .stdout(contains("fuzzy").not());
}
