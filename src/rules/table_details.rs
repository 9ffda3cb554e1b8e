//! Rule3: destination tables against the "Table Details" sheet.

use std::collections::BTreeSet;

use crate::{
    headers::{Anchor, HeaderDetection, HeaderIndex, TABLE_NAME_ALIASES, detect_header_row},
    mismatch::{IssueKind, MismatchRecord},
    values::{non_null, normalize_table},
    workbook::Sheet,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDetailsFindings {
    /// Baseline tables with no Table Details entry; their rows fail.
    pub missing: BTreeSet<String>,
    pub records: Vec<MismatchRecord>,
}

/// Table names listed on the Table Details sheet. A single filled cell is
/// enough to count as the header row there.
pub fn listed_tables(sheet: &Sheet, detection: &HeaderDetection) -> BTreeSet<String> {
    let detection = HeaderDetection {
        min_non_empty: 1,
        ..*detection
    };
    let header_row = detect_header_row(&sheet.rows, &detection);
    let index = HeaderIndex::build(&sheet.row_values(header_row));
    let Some(table_col) = index
        .resolve_any(TABLE_NAME_ALIASES, Anchor::None)
        .or_else(|| index.find_containing("TABLE"))
    else {
        return BTreeSet::new();
    };
    sheet
        .rows
        .iter()
        .skip(header_row + 1)
        .filter_map(|row| row.get(table_col))
        .filter_map(|cell| non_null(&cell.value))
        .map(normalize_table)
        .collect()
}

pub fn check(baseline: &BTreeSet<String>, listed: &BTreeSet<String>) -> TableDetailsFindings {
    let mut findings = TableDetailsFindings::default();
    for table in baseline.difference(listed) {
        findings.missing.insert(table.clone());
        findings.records.push(MismatchRecord::table_level(
            table,
            IssueKind::MissingInTableDetails,
            "Destination table used in the mapping sheet but not found in Table Details",
        ));
    }
    for table in listed.difference(baseline) {
        findings.records.push(MismatchRecord::table_level(
            table,
            IssueKind::NotUsedInBaseline,
            "Table listed in Table Details but not used in the mapping sheet",
        ));
    }
    findings
}
