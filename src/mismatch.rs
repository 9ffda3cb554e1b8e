//! Structured issue records written to the per-rule detail sheets.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    MissingInTableDetails,
    NotUsedInBaseline,
    DmwOnly,
    MissingInDmw,
    TypeMismatch,
    NullableMismatch,
    NotInMaster,
    MasterTableMissing,
    AddedInCurrent,
    RemovedInCurrent,
    DatatypeChanged,
    NullableChanged,
    TransformationChanged,
    Modified,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::MissingInTableDetails => "MISSING_IN_TABLE_DETAILS",
            IssueKind::NotUsedInBaseline => "NOT_USED_IN_BASELINE",
            IssueKind::DmwOnly => "DMW_ONLY",
            IssueKind::MissingInDmw => "MISSING_IN_DMW",
            IssueKind::TypeMismatch => "TYPE_MISMATCH",
            IssueKind::NullableMismatch => "NULLABLE_MISMATCH",
            IssueKind::NotInMaster => "NOT_IN_MASTER",
            IssueKind::MasterTableMissing => "MASTER_TABLE_MISSING",
            IssueKind::AddedInCurrent => "ADDED_IN_CURRENT",
            IssueKind::RemovedInCurrent => "REMOVED_IN_CURRENT",
            IssueKind::DatatypeChanged => "DATATYPE_CHANGED",
            IssueKind::NullableChanged => "NULLABLE_CHANGED",
            IssueKind::TransformationChanged => "TRANSFORMATION_CHANGED",
            IssueKind::Modified => "MODIFIED",
        }
    }

    /// Attribute drift that is logged but never fails a row.
    pub fn is_informational(self) -> bool {
        matches!(
            self,
            IssueKind::DatatypeChanged | IssueKind::NullableChanged | IssueKind::TransformationChanged
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MismatchRecord {
    pub table: String,
    pub column: String,
    pub issue: IssueKind,
    pub details: String,
}

impl MismatchRecord {
    pub fn new(table: &str, column: &str, issue: IssueKind, details: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            issue,
            details: details.into(),
        }
    }

    pub fn table_level(table: &str, issue: IssueKind, details: impl Into<String>) -> Self {
        Self::new(table, "", issue, details)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MismatchSheet {
    TableDetails,
    DdlAlignment,
    Reference,
    WorkbookDrift,
    DdlDrift,
}

impl MismatchSheet {
    pub const ALL: [MismatchSheet; 5] = [
        MismatchSheet::TableDetails,
        MismatchSheet::DdlAlignment,
        MismatchSheet::Reference,
        MismatchSheet::WorkbookDrift,
        MismatchSheet::DdlDrift,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            MismatchSheet::TableDetails => "Rule3_Table_Mismatch",
            MismatchSheet::DdlAlignment => "Rule4_DDL_Mismatch",
            MismatchSheet::Reference => "Rule5_Ref_Master_Mismatch",
            MismatchSheet::WorkbookDrift => "Rule6_DMW_Drift",
            MismatchSheet::DdlDrift => "Rule7_DDL_Drift",
        }
    }

    pub fn headers(self) -> &'static [&'static str] {
        match self {
            MismatchSheet::TableDetails => &["Table", "Issue", "Details"],
            _ => &["Table", "Column", "Issue", "Details"],
        }
    }

    pub fn row(self, record: &MismatchRecord) -> Vec<String> {
        match self {
            MismatchSheet::TableDetails => vec![
                record.table.clone(),
                record.issue.to_string(),
                record.details.clone(),
            ],
            _ => vec![
                record.table.clone(),
                record.column.clone(),
                record.issue.to_string(),
                record.details.clone(),
            ],
        }
    }
}
