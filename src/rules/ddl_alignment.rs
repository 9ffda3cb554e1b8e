//! Rule4: workbook destination columns against the parsed DDL.
//!
//! Only tables that appear in both the DDL and the workbook are compared. A
//! single mismatching column fails every row of its table; the per-column
//! details are kept so the offending row gets the specific remark.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    ddl::TableSchema,
    keys::{DestKey, DestinationCatalog},
    mismatch::{IssueKind, MismatchRecord},
    sql_types::types_compatible,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentFindings {
    pub failed_tables: BTreeSet<String>,
    pub column_details: BTreeMap<DestKey, Vec<String>>,
    pub records: Vec<MismatchRecord>,
}

impl AlignmentFindings {
    fn push(&mut self, key: DestKey, issue: IssueKind, details: String) {
        self.failed_tables.insert(key.table.clone());
        self.records
            .push(MismatchRecord::new(&key.table, &key.column, issue, details.clone()));
        self.column_details
            .entry(key)
            .or_default()
            .push(format!("{issue} ({details})"));
    }
}

pub fn check(schema: &TableSchema, catalog: &DestinationCatalog) -> AlignmentFindings {
    let mut findings = AlignmentFindings::default();
    for (table, ddl_columns) in schema.tables() {
        let Some(dmw_columns) = catalog.keys.columns(table) else {
            continue;
        };

        for column in dmw_columns {
            let key = DestKey {
                table: table.clone(),
                column: column.clone(),
            };
            let Some(ddl_def) = ddl_columns.get(column) else {
                findings.push(key, IssueKind::DmwOnly, "column mapped in DMW but absent from DDL".into());
                continue;
            };
            let Some(dmw_def) = catalog.defs.get(&key) else {
                continue;
            };

            // An empty workbook type or nullability is Rule1's concern.
            if let (Some(dmw_type), Some(ddl_type)) = (dmw_def.sql_type(), ddl_def.sql_type()) {
                if !types_compatible(&dmw_type, &ddl_type) {
                    findings.push(
                        key.clone(),
                        IssueKind::TypeMismatch,
                        format!("DMW {dmw_type} vs DDL {ddl_type}"),
                    );
                }
            }
            let ddl_nullable = ddl_def.effective_nullability();
            if dmw_def.nullable.is_known() && dmw_def.nullable != ddl_nullable {
                findings.push(
                    key,
                    IssueKind::NullableMismatch,
                    format!("DMW {} vs DDL {}", dmw_def.nullable, ddl_nullable),
                );
            }
        }

        for column in ddl_columns.keys().filter(|c| !dmw_columns.contains(*c)) {
            let key = DestKey {
                table: table.clone(),
                column: column.clone(),
            };
            findings.push(key, IssueKind::MissingInDmw, "DDL column not mapped in DMW".into());
        }
    }
    findings
}
