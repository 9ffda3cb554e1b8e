//! Rule2: a sprint change must be explained in the change log.

use crate::{
    headers::{DmwColumns, DmwField},
    rules::RuleOutcome,
    values::non_null,
    workbook::CellData,
};

pub fn evaluate(columns: &DmwColumns, row: &[CellData]) -> RuleOutcome {
    let introduced = non_null(columns.value(DmwField::IntroducedSprint, row));
    let updated = non_null(columns.value(DmwField::LastUpdatedSprint, row));
    let (Some(introduced), Some(updated)) = (introduced, updated) else {
        return RuleOutcome::pass();
    };
    if introduced.eq_ignore_ascii_case(updated) {
        return RuleOutcome::pass();
    }
    if non_null(columns.value(DmwField::ChangeLog, row)).is_some() {
        RuleOutcome::pass()
    } else {
        RuleOutcome::fail(format!(
            "Rule2: updated in {updated} after {introduced} without a change log entry"
        ))
    }
}
