//! Second pass: turns pass-one row records into final rows.
//!
//! Pass one only knows what a single row says about itself (Rule1, Rule2 and
//! the row kind). The set comparisons for Rule3 to Rule6 run afterwards, and
//! this module folds their findings back into each row exactly once, then
//! appends one synthetic row per destination key removed since the previous
//! workbook.

use crate::{
    classify::RowKind,
    config::ValidatorConfig,
    keys::DestKey,
    mismatch::{MismatchRecord, MismatchSheet},
    rules::{
        Rule, Verdict, Verdicts, ddl_alignment::AlignmentFindings, drift::WorkbookDrift,
        reference::ReferenceFindings, table_details::TableDetailsFindings,
    },
};

pub const CANCELLED_REMARK: &str = "Row struck through (cancelled)";

/// A main-sheet row after the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 1-based row number in the source sheet.
    pub sheet_row: usize,
    pub cells: Vec<String>,
    pub kind: RowKind,
    /// Normalized destination table, when filled in.
    pub table: Option<String>,
    pub key: Option<DestKey>,
    pub logic: String,
    pub verdicts: Verdicts,
    pub remarks: Vec<String>,
}

/// Set-level results of the table and column rules.
#[derive(Debug, Clone, Default)]
pub struct Findings {
    pub table_details: Option<TableDetailsFindings>,
    pub alignment: AlignmentFindings,
    pub reference: Option<ReferenceFindings>,
    pub workbook_drift: Option<WorkbookDrift>,
    pub ddl_drift: Option<Vec<MismatchRecord>>,
}

impl Findings {
    /// Detail-sheet contents, one entry per rule whose inputs were supplied.
    pub fn mismatch_sheets(&self) -> Vec<(MismatchSheet, &[MismatchRecord])> {
        let mut sheets: Vec<(MismatchSheet, &[MismatchRecord])> = Vec::new();
        if let Some(details) = &self.table_details {
            sheets.push((MismatchSheet::TableDetails, &details.records));
        }
        sheets.push((MismatchSheet::DdlAlignment, &self.alignment.records));
        if let Some(reference) = &self.reference {
            sheets.push((MismatchSheet::Reference, &reference.records));
        }
        if let Some(drift) = &self.workbook_drift {
            sheets.push((MismatchSheet::WorkbookDrift, &drift.records));
        }
        if let Some(records) = &self.ddl_drift {
            sheets.push((MismatchSheet::DdlDrift, records));
        }
        sheets
    }
}

/// Where the destination identifiers live, for synthetic rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowLayout {
    pub width: usize,
    pub dest_table: Option<usize>,
    pub dest_column: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalRow {
    /// `None` for rows injected for removed keys.
    pub sheet_row: Option<usize>,
    pub cells: Vec<String>,
    pub key: Option<DestKey>,
    pub logic: String,
    pub verdicts: Verdicts,
    pub status: Verdict,
    pub remarks: String,
    pub suggestion: String,
}

impl FinalRow {
    pub fn is_synthetic(&self) -> bool {
        self.sheet_row.is_none()
    }
}

pub fn finalize_rows(
    rows: Vec<RowRecord>,
    findings: &Findings,
    layout: &RowLayout,
    config: &ValidatorConfig,
) -> Vec<FinalRow> {
    let mut finals: Vec<FinalRow> = rows
        .into_iter()
        .map(|row| finalize(row, findings, &config.remark_separator))
        .collect();

    if let Some(drift) = &findings.workbook_drift {
        finals.extend(drift.removed.iter().map(|key| removed_row(key, layout)));
    }
    finals
}

fn finalize(row: RowRecord, findings: &Findings, separator: &str) -> FinalRow {
    let RowRecord {
        sheet_row,
        cells,
        kind,
        table,
        key,
        logic,
        mut verdicts,
        mut remarks,
    } = row;

    if !kind.is_excluded() {
        let mut fail = |rule: Rule, remark: String| {
            verdicts.set(rule, Verdict::Fail);
            if !remarks.contains(&remark) {
                remarks.push(remark);
            }
        };

        if let (Some(details), Some(table)) = (&findings.table_details, &table) {
            if details.missing.contains(table) {
                fail(
                    Rule::TableDetails,
                    format!("Rule3: table {table} missing from Table Details"),
                );
            }
        }

        if kind != RowKind::DestinationOnlySkip {
            if let Some(table) = table.as_ref().filter(|t| findings.alignment.failed_tables.contains(*t)) {
                let remark = match key.as_ref().and_then(|k| findings.alignment.column_details.get(k)) {
                    Some(details) => format!("Rule4: {}", details.join("; ")),
                    None => format!(
                        "Rule4: table {table} has DDL mismatches (see {})",
                        MismatchSheet::DdlAlignment.sheet_name()
                    ),
                };
                fail(Rule::DdlAlignment, remark);
            }
        }

        if let (Some(reference), Some(table)) = (&findings.reference, &table) {
            if reference.failed_tables.contains(table) {
                fail(
                    Rule::Reference,
                    format!("Rule5: reference columns of {table} missing in master"),
                );
            }
        }

        if let (Some(drift), Some(key)) = (&findings.workbook_drift, &key) {
            if drift.added.contains(key) {
                fail(
                    Rule::WorkbookDrift,
                    format!("Rule6: {key} added since the previous DMW"),
                );
            }
        }
    }

    FinalRow {
        sheet_row: Some(sheet_row),
        cells,
        key,
        logic,
        status: verdicts.status(),
        verdicts,
        remarks: remarks.join(separator),
        suggestion: String::new(),
    }
}

fn removed_row(key: &DestKey, layout: &RowLayout) -> FinalRow {
    let mut cells = vec![String::new(); layout.width];
    for (slot, value) in [(layout.dest_table, &key.table), (layout.dest_column, &key.column)] {
        if let Some(cell) = slot.and_then(|idx| cells.get_mut(idx)) {
            *cell = value.clone();
        }
    }
    let mut verdicts = Verdicts::all(Verdict::NotApplicable);
    verdicts.set(Rule::WorkbookDrift, Verdict::Fail);
    FinalRow {
        sheet_row: None,
        cells,
        key: Some(key.clone()),
        logic: String::new(),
        status: verdicts.status(),
        verdicts,
        remarks: format!("Rule6: {key} removed since the previous DMW"),
        suggestion: String::new(),
    }
}
