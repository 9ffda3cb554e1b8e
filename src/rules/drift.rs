//! Rule6 and Rule7: differences against previous snapshots.
//!
//! Workbook drift compares destination keys of the previous and current
//! mapping sheet. Added and removed keys fail; attribute changes on keys kept
//! in both snapshots are logged for information only. DDL drift compares two
//! parsed schemas and only ever feeds its detail sheet.

use std::collections::BTreeSet;

use crate::{
    ddl::TableSchema,
    keys::{DestKey, DestinationCatalog},
    mismatch::{IssueKind, MismatchRecord},
    values::collapse_whitespace,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkbookDrift {
    pub added: BTreeSet<DestKey>,
    pub removed: BTreeSet<DestKey>,
    pub records: Vec<MismatchRecord>,
}

impl WorkbookDrift {
    pub fn is_clean(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn diff_workbooks(previous: &DestinationCatalog, current: &DestinationCatalog) -> WorkbookDrift {
    let mut drift = WorkbookDrift::default();

    for key in current.keys.keys().filter(|key| !previous.keys.contains(key)) {
        drift.records.push(MismatchRecord::new(
            &key.table,
            &key.column,
            IssueKind::AddedInCurrent,
            "destination column added since the previous DMW",
        ));
        drift.added.insert(key);
    }
    for key in previous.keys.keys().filter(|key| !current.keys.contains(key)) {
        drift.records.push(MismatchRecord::new(
            &key.table,
            &key.column,
            IssueKind::RemovedInCurrent,
            "destination column removed since the previous DMW",
        ));
        drift.removed.insert(key);
    }

    for (key, before) in &previous.defs {
        let Some(after) = current.defs.get(key) else {
            continue;
        };
        if before.data_type != after.data_type {
            drift.records.push(attribute_change(
                key,
                IssueKind::DatatypeChanged,
                &before.data_type,
                &after.data_type,
            ));
        }
        if before.nullable != after.nullable {
            drift.records.push(attribute_change(
                key,
                IssueKind::NullableChanged,
                before.nullable.as_str(),
                after.nullable.as_str(),
            ));
        }
        let (old_logic, new_logic) = (
            collapse_whitespace(&before.transform),
            collapse_whitespace(&after.transform),
        );
        if old_logic != new_logic {
            drift.records.push(attribute_change(
                key,
                IssueKind::TransformationChanged,
                &old_logic,
                &new_logic,
            ));
        }
    }
    drift
}

fn attribute_change(key: &DestKey, issue: IssueKind, before: &str, after: &str) -> MismatchRecord {
    MismatchRecord::new(
        &key.table,
        &key.column,
        issue,
        format!("{} -> {}", shown(before), shown(after)),
    )
}

fn shown(value: &str) -> &str {
    if value.is_empty() { "(blank)" } else { value }
}

pub fn diff_ddl(previous: &TableSchema, current: &TableSchema) -> Vec<MismatchRecord> {
    let mut records = Vec::new();
    for (table, _) in current.tables().filter(|(t, _)| !previous.contains_table(t)) {
        records.push(MismatchRecord::table_level(
            table,
            IssueKind::AddedInCurrent,
            "table added since the previous DDL",
        ));
    }
    for (table, _) in previous.tables().filter(|(t, _)| !current.contains_table(t)) {
        records.push(MismatchRecord::table_level(
            table,
            IssueKind::RemovedInCurrent,
            "table removed since the previous DDL",
        ));
    }

    for (table, after_columns) in current.tables() {
        let Some(before_columns) = previous.table(table) else {
            continue;
        };
        for (column, after) in after_columns {
            match before_columns.get(column) {
                None => records.push(MismatchRecord::new(
                    table,
                    column,
                    IssueKind::AddedInCurrent,
                    format!("column added as {}", describe(&after.data_type, after.nullable.as_str())),
                )),
                Some(before) if before != after => records.push(MismatchRecord::new(
                    table,
                    column,
                    IssueKind::Modified,
                    format!(
                        "{} -> {}",
                        describe(&before.data_type, before.nullable.as_str()),
                        describe(&after.data_type, after.nullable.as_str())
                    ),
                )),
                Some(_) => {}
            }
        }
        for column in before_columns.keys().filter(|c| !after_columns.contains_key(*c)) {
            records.push(MismatchRecord::new(
                table,
                column,
                IssueKind::RemovedInCurrent,
                "column removed since the previous DDL",
            ));
        }
    }
    records
}

fn describe(data_type: &str, nullable: &str) -> String {
    if nullable.is_empty() {
        data_type.to_string()
    } else {
        format!("{data_type} {nullable}")
    }
}
