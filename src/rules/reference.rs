//! Rule5: every reference-workbook column must exist in the master workbook.

use std::collections::BTreeSet;

use crate::{
    keys::DestKeySet,
    mismatch::{IssueKind, MismatchRecord},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceFindings {
    pub failed_tables: BTreeSet<String>,
    pub records: Vec<MismatchRecord>,
}

pub fn check(reference: &DestKeySet, master: &DestKeySet) -> ReferenceFindings {
    let mut findings = ReferenceFindings::default();
    for (table, columns) in reference.tables() {
        match master.columns(table) {
            None => {
                for column in columns {
                    findings.records.push(MismatchRecord::new(
                        table,
                        column,
                        IssueKind::MasterTableMissing,
                        "table not found in master workbook",
                    ));
                }
            }
            Some(master_columns) => {
                for column in columns.difference(master_columns) {
                    findings.records.push(MismatchRecord::new(
                        table,
                        column,
                        IssueKind::NotInMaster,
                        "column present in reference but missing in master",
                    ));
                }
            }
        }
    }
    findings.failed_tables = findings.records.iter().map(|r| r.table.clone()).collect();
    findings
}
