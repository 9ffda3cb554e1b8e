mod common;

use std::{fs, path::PathBuf};

use assert_cmd::Command;
use common::{TestWorkspace, dmw_row, dmw_sheet, strike_row};
use dmw_validator::workbook::{Sheet, Workbook};
use predicates::str::contains;

const SHEET: &str = "Baseline Data Model";
const CUSTOMER_DDL: &str = "CREATE TABLE [dbo].[Customer] (
    [Id] INT NOT NULL,
    [Email] VARCHAR(100) NULL
);";

fn bin() -> Command {
    Command::cargo_bin("dmw-validator").expect("binary exists")
}

fn customer_rows(email_logic: &str) -> Vec<Vec<String>> {
    vec![
        dmw_row("Customer", "Id", "Yes", "INT", "No", "CAST(src.id AS INT)"),
        dmw_row("Customer", "Email", "Yes", "VARCHAR(100)", "", email_logic),
        dmw_row("Customer", "Ghost", "Yes", "", "", ""),
    ]
}

/// Mapping workbook whose third data row is struck through, plus a
/// Table Details sheet listing one table the mapping never uses.
fn customer_workbook(ws: &TestWorkspace) -> PathBuf {
    customer_workbook_with(ws, "LOWER(email)")
}

fn customer_workbook_with(ws: &TestWorkspace, email_logic: &str) -> PathBuf {
    let mapping = strike_row(dmw_sheet(SHEET, &customer_rows(email_logic)), 4);
    let details = Sheet::from_values(
        "Table Details",
        [vec!["Table Name", "Owner"], vec!["Customer", "CRM"], vec!["Legacy", "none"]],
    );
    ws.write_workbook("dmw.xlsx", &[mapping, details])
}

fn cell(sheet: &Sheet, row: usize, column: usize) -> String {
    sheet
        .rows
        .get(row)
        .and_then(|cells| cells.get(column))
        .map(|cell| cell.value.clone())
        .unwrap_or_default()
}

#[test]
fn validate_writes_annotated_workbook() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Validation_Status"));

    let book = Workbook::open(&out).expect("read output workbook");
    assert_eq!(
        book.sheet_names(),
        [
            "Baseline Data Model_output",
            "Rule3_Table_Mismatch",
            "Rule4_DDL_Mismatch",
            "Summary_Stats",
            "Rules_Reference",
        ]
    );

    let main = book.main_sheet(None).expect("main sheet");
    assert_eq!(cell(main, 0, 0), "Source Table");
    assert_eq!(cell(main, 0, 13), "Rule1");
    assert_eq!(cell(main, 0, 20), "Validation_Status");
    assert_eq!(cell(main, 0, 22), "AI_Suggestion");

    // Id
    assert_eq!(cell(main, 1, 3), "Id");
    assert!((13..=19).all(|col| cell(main, 1, col) == "PASS"));
    assert_eq!(cell(main, 1, 20), "PASS");
    // Email lacks a nullable flag.
    assert_eq!(cell(main, 2, 13), "FAIL");
    assert_eq!(cell(main, 2, 20), "FAIL");
    assert!(cell(main, 2, 21).contains("Rule1: missing nullable flag"));
    // Ghost is struck through.
    assert_eq!(cell(main, 3, 13), "N/A");
    assert_eq!(cell(main, 3, 20), "N/A");
    assert_eq!(cell(main, 3, 21), "Row struck through (cancelled)");

    let rule3 = book.sheet("Rule3_Table_Mismatch").expect("rule3 sheet");
    assert_eq!(cell(rule3, 1, 0), "LEGACY");
    assert_eq!(cell(rule3, 1, 1), "NOT_USED_IN_BASELINE");
    assert_eq!(rule3.row_count(), 2);

    let rule4 = book.sheet("Rule4_DDL_Mismatch").expect("rule4 sheet");
    assert_eq!(rule4.row_values(0), ["Table", "Column", "Issue", "Details"]);
    assert_eq!(rule4.row_count(), 1);

    let summary = book.sheet("Summary_Stats").expect("summary sheet");
    assert_eq!(summary.row_values(8), ["Validation_Status", "1", "1", "1", "3"]);
    assert_eq!(cell(summary, 10, 0), "Generated At");

    let reference = book.sheet("Rules_Reference").expect("reference sheet");
    assert_eq!(reference.row_count(), 8);
    assert_eq!(cell(reference, 7, 0), "Rule7");
}

#[test]
fn drift_inputs_add_drift_sheets() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let previous_rows = vec![
        dmw_row("Customer", "Id", "Yes", "SMALLINT", "No", "CAST(src.id AS INT)"),
        dmw_row("Customer", "Phone", "Yes", "VARCHAR(20)", "Yes", "TRIM(src.phone)"),
    ];
    let prev_dmw = ws.write_workbook("prev.xlsx", &[dmw_sheet(SHEET, &previous_rows)]);
    let prev_ddl = ws.write("prev.sql", "CREATE TABLE Customer (Id SMALLINT NOT NULL);");
    let out = ws.path().join("validated.xlsx");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "--prev-dmw",
            prev_dmw.to_str().unwrap(),
            "--prev-ddl",
            prev_ddl.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let book = Workbook::open(&out).expect("read output workbook");
    let drift = book.sheet("Rule6_DMW_Drift").expect("rule6 sheet");
    let issues: Vec<(String, String)> = (1..drift.row_count())
        .map(|row| (cell(drift, row, 1), cell(drift, row, 2)))
        .collect();
    assert_eq!(
        issues,
        [
            ("EMAIL".to_string(), "ADDED_IN_CURRENT".to_string()),
            ("PHONE".to_string(), "REMOVED_IN_CURRENT".to_string()),
            ("ID".to_string(), "DATATYPE_CHANGED".to_string()),
        ]
    );

    let ddl_drift = book.sheet("Rule7_DDL_Drift").expect("rule7 sheet");
    assert_eq!(cell(ddl_drift, 1, 0), "CUSTOMER");
    assert_eq!(cell(ddl_drift, 1, 1), "EMAIL");
    assert_eq!(cell(ddl_drift, 1, 2), "ADDED_IN_CURRENT");
    assert_eq!(cell(ddl_drift, 2, 2), "MODIFIED");

    // The removed Phone mapping is appended as a synthetic row.
    let main = book.main_sheet(None).expect("main sheet");
    let last = main.row_count() - 1;
    assert_eq!(cell(main, last, 3), "PHONE");
    assert_eq!(cell(main, last, 18), "FAIL");
    assert_eq!(cell(main, last, 13), "N/A");
}

#[test]
fn missing_optional_input_is_skipped() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");
    let absent = ws.path().join("nowhere.xlsx");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "--prev-dmw",
            absent.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success();

    let book = Workbook::open(&out).expect("read output workbook");
    assert!(book.sheet("Rule6_DMW_Drift").is_none());
}

#[test]
fn corrupt_workbook_is_fatal_and_writes_nothing() {
    let ws = TestWorkspace::new();
    let dmw = ws.write("broken.xlsx", "this is not a zip archive");
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Loading mapping workbook"));
    assert!(!out.exists());
}

#[test]
fn unknown_sheet_lists_available_sheets() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "--sheet",
            "Mapping v2",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("available sheets: Baseline Data Model, Table Details"));
}

#[test]
fn advice_dir_receives_artifacts() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");
    let advice = ws.path().join("advice");

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--enable-advisor",
            "--advice-dir",
            advice.to_str().unwrap(),
        ])
        .assert()
        .success();

    let json = fs::read_to_string(advice.join("logic_quality.json")).expect("logic quality");
    let entries: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    let entries = entries.as_array().expect("array of entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["Target Field"], "EMAIL");
    assert_eq!(entries[0]["AI_Judgement"], "WARN");
    assert_eq!(
        fs::read_to_string(advice.join("dq_checks_ai.sql")).expect("dq sql"),
        "-- No DQ SQL generated\n"
    );
    assert!(advice.join("recon_ai.sql").exists());

    let book = Workbook::open(&out).expect("read output workbook");
    let main = book.main_sheet(None).expect("main sheet");
    assert!(cell(main, 2, 22).starts_with("WARN: No table.field pattern"));
    assert_eq!(cell(main, 1, 22), "");
}

#[cfg(unix)]
#[test]
fn external_advisor_answers_are_parsed() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook_with(&ws, "LOWER(src.email)");
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    let out = ws.path().join("validated.xlsx");
    let advice = ws.path().join("advice");
    let script = "cat > /dev/null; printf '%s' '```json\n{\"judgement\":\"Risky\",\"explanation\":\"no null guard\",\"dq_sql\":\"SELECT 1;\"}\n```'";

    bin()
        .args([
            "validate",
            "--dmw",
            dmw.to_str().unwrap(),
            "--ddl",
            ddl.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--advisor-command",
            "sh",
            "--advisor-arg",
            "-c",
            "--advisor-arg",
            script,
            "--advice-dir",
            advice.to_str().unwrap(),
        ])
        .assert()
        .success();

    let dq = fs::read_to_string(advice.join("dq_checks_ai.sql")).expect("dq sql");
    assert!(dq.contains("-- CUSTOMER.EMAIL\nSELECT 1;"));
    let book = Workbook::open(&out).expect("read output workbook");
    let main = book.main_sheet(None).expect("main sheet");
    assert_eq!(cell(main, 2, 22), "Risky: no null guard");
}

#[test]
fn ddl_command_lists_columns() {
    let ws = TestWorkspace::new();
    let ddl = ws.write("schema.sql", CUSTOMER_DDL);
    bin()
        .args(["ddl", "--ddl", ddl.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("CUSTOMER"))
        .stdout(contains("VARCHAR(100)"))
        .stdout(contains("NOT NULL"));
}

#[test]
fn headers_command_reports_resolved_columns() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    bin()
        .args(["headers", "--dmw", dmw.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Header row: 2"))
        .stdout(contains("Destination Column Name"));
}

#[test]
fn headers_command_honours_config_detection_bounds() {
    let ws = TestWorkspace::new();
    let dmw = customer_workbook(&ws);
    let config = ws.write("narrow.yaml", "header_detection:\n  min_non_empty: 1\n  max_scan: 1\n");
    bin()
        .args(["headers", "--dmw", dmw.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Header row: 1"));

    let broken = ws.write("broken.yaml", "header_detection: [unclosed");
    bin()
        .args(["headers", "--dmw", dmw.to_str().unwrap(), "-c", broken.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Loading configuration"));
}
