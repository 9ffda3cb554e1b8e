//! Output workbook serialization.

use std::path::Path;

use anyhow::{Result, anyhow};
use log::debug;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::{
    mismatch::MismatchSheet,
    rules::Rule,
    validate::ValidationReport,
};

/// Columns appended to the mapping sheet, in order.
pub const APPENDED_COLUMNS: [&str; 10] = [
    "Rule1",
    "Rule2",
    "Rule3",
    "Rule4",
    "Rule5",
    "Rule6",
    "Rule7",
    "Validation_Status",
    "Validation_Remarks",
    "AI_Suggestion",
];

const MAX_SHEET_NAME: usize = 31;

pub fn write_report(report: &ValidationReport, path: &Path) -> Result<()> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    let main = add_sheet(&mut book, &report.sheet_name)?;
    let mut header = report.headers.clone();
    header.extend(APPENDED_COLUMNS.iter().map(|name| name.to_string()));
    write_row(main, 1, &header);
    for (offset, row) in report.rows.iter().enumerate() {
        let mut values = row.cells.clone();
        values.resize(report.headers.len(), String::new());
        values.extend(row.verdicts.iter().map(|(_, verdict)| verdict.to_string()));
        values.push(row.status.to_string());
        values.push(row.remarks.clone());
        values.push(row.suggestion.clone());
        write_row(main, offset as u32 + 2, &values);
    }

    for (kind, records) in report.findings.mismatch_sheets() {
        let sheet = add_sheet(&mut book, kind.sheet_name())?;
        write_row(sheet, 1, kind.headers());
        for (offset, record) in records.iter().enumerate() {
            write_row(sheet, offset as u32 + 2, &kind.row(record));
        }
        debug!("{}: {} record(s)", kind.sheet_name(), records.len());
    }

    let summary = add_sheet(&mut book, "Summary_Stats")?;
    write_row(summary, 1, &["Rule", "PASS", "FAIL", "N/A", "Total"]);
    let mut next_row = 2u32;
    for line in &report.summary.lines {
        write_row(
            summary,
            next_row,
            &[
                line.label.clone(),
                line.pass.to_string(),
                line.fail.to_string(),
                line.not_applicable.to_string(),
                line.total().to_string(),
            ],
        );
        next_row += 1;
    }
    write_row(
        summary,
        next_row + 1,
        &[
            "Generated At".to_string(),
            report.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ],
    );

    let reference = add_sheet(&mut book, "Rules_Reference")?;
    write_row(reference, 1, &["Rule", "Description"]);
    for (offset, rule) in Rule::ALL.iter().enumerate() {
        write_row(
            reference,
            offset as u32 + 2,
            &[rule.column_name(), rule.description()],
        );
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|err| anyhow!("Saving workbook {path:?}: {err}"))?;
    Ok(())
}

fn add_sheet<'a>(book: &'a mut Spreadsheet, name: &str) -> Result<&'a mut Worksheet> {
    let name: String = name.chars().take(MAX_SHEET_NAME).collect();
    book.new_sheet(&name)
        .map_err(|err| anyhow!("Adding sheet '{name}': {err}"))
}

fn write_row<S: AsRef<str>>(sheet: &mut Worksheet, row: u32, values: &[S]) {
    for (idx, value) in values.iter().enumerate() {
        let value = value.as_ref();
        if value.is_empty() {
            continue;
        }
        sheet
            .get_cell_mut((idx as u32 + 1, row))
            .set_value_string(value);
    }
}
