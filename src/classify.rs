use crate::{
    headers::{DmwColumns, DmwField},
    values::is_null_sentinel,
    workbook::CellData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Every cell blank; not emitted.
    Empty,
    /// At least one cell carries a strikethrough font.
    Cancelled,
    /// Neither source nor destination identifiers are filled in.
    Helper,
    /// Destination table or column missing; DDL alignment does not apply.
    DestinationOnlySkip,
    Active,
}

impl RowKind {
    /// Rows whose verdicts are all `N/A`.
    pub fn is_excluded(self) -> bool {
        matches!(self, RowKind::Cancelled | RowKind::Helper)
    }

    pub fn label(self) -> &'static str {
        match self {
            RowKind::Empty => "empty",
            RowKind::Cancelled => "cancelled",
            RowKind::Helper => "helper",
            RowKind::DestinationOnlySkip => "destination-only",
            RowKind::Active => "active",
        }
    }
}

pub fn classify_row(columns: &DmwColumns, row: &[CellData]) -> RowKind {
    if row.iter().all(CellData::is_blank) {
        return RowKind::Empty;
    }
    if row.iter().any(|cell| cell.strike) {
        return RowKind::Cancelled;
    }
    let missing = |field| is_null_sentinel(columns.value(field, row));
    let dest_missing = missing(DmwField::DestTable) || missing(DmwField::DestColumn);
    let source_missing = missing(DmwField::SourceTable) && missing(DmwField::SourceColumn);
    let dest_all_missing = missing(DmwField::DestTable) && missing(DmwField::DestColumn);
    if source_missing && dest_all_missing {
        RowKind::Helper
    } else if dest_missing {
        RowKind::DestinationOnlySkip
    } else {
        RowKind::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::HeaderIndex;

    fn columns() -> DmwColumns {
        let headers = ["Source Table", "Source Column Name", "Destination Table", "Destination Column Name"]
            .map(String::from);
        DmwColumns::resolve(&HeaderIndex::build(&headers))
    }

    fn row(values: &[&str]) -> Vec<CellData> {
        values.iter().map(|value| CellData::new(*value)).collect()
    }

    #[test]
    fn kinds() {
        let cols = columns();
        assert_eq!(classify_row(&cols, &row(&["", " ", "", ""])), RowKind::Empty);
        assert_eq!(classify_row(&cols, &row(&["NA", "n/a", "nil", ""])), RowKind::Helper);
        assert_eq!(classify_row(&cols, &row(&["S", "C", "T", "NA"])), RowKind::DestinationOnlySkip);
        assert_eq!(classify_row(&cols, &row(&["", "", "T", "C"])), RowKind::Active);
        assert_eq!(classify_row(&cols, &row(&["S", "C", "T", "C"])), RowKind::Active);
    }

    #[test]
    fn strikethrough_wins_over_content() {
        let cols = columns();
        let mut cells = row(&["S", "C", "T", "C"]);
        cells[1].strike = true;
        assert_eq!(classify_row(&cols, &cells), RowKind::Cancelled);
    }
}
