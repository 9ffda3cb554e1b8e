//! Rule1: mapping completeness.

use crate::{
    headers::{DmwColumns, DmwField},
    keys::declared_type,
    rules::RuleOutcome,
    values::{YesNo, non_null},
    workbook::CellData,
};

pub fn evaluate(columns: &DmwColumns, row: &[CellData]) -> RuleOutcome {
    if columns.get(DmwField::Migrating).is_none() {
        return RuleOutcome::pass();
    }
    match YesNo::parse(columns.value(DmwField::Migrating, row)) {
        Some(YesNo::No) => {
            if present(columns, DmwField::Reason, row) {
                RuleOutcome::pass()
            } else {
                RuleOutcome::fail("Rule1: not migrating but no reason given")
            }
        }
        Some(YesNo::Yes) => {
            let missing = missing_attributes(columns, row);
            if missing.is_empty() {
                RuleOutcome::pass()
            } else {
                RuleOutcome::fail(format!("Rule1: missing {}", missing.join(", ")))
            }
        }
        None => RuleOutcome::pass(),
    }
}

/// A field counts as present when its column is absent from the sheet.
fn present(columns: &DmwColumns, field: DmwField, row: &[CellData]) -> bool {
    columns.get(field).is_none() || non_null(columns.value(field, row)).is_some()
}

fn missing_attributes(columns: &DmwColumns, row: &[CellData]) -> Vec<String> {
    let mut missing = Vec::new();
    for (field, label) in [
        (DmwField::DestTable, "destination table"),
        (DmwField::DestColumn, "destination column"),
        (DmwField::DataType, "data type"),
        (DmwField::Nullable, "nullable flag"),
        (DmwField::Transformation, "transformation logic"),
    ] {
        if !present(columns, field, row) {
            missing.push(label.to_string());
        }
    }

    if let Some(ty) = declared_type(columns, row) {
        if ty.requires_length() && ty.params.is_none() {
            missing.push(format!("length/precision for {}", ty.base));
        }
    }
    missing
}
