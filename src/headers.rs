//! Header detection and canonical column resolution.
//!
//! Mapping workbooks have gone through several template versions. Headers get
//! renamed ("Migrating Column" vs "Migrating or Not (Yes/No)"), some appear
//! twice (a source-side and a destination-side "Data Type"), and one or two
//! title rows usually sit above the real header. [`HeaderIndex`] keeps every
//! position a normalized header text occurs at, and [`HeaderIndex::resolve`]
//! picks one using an alias list plus an optional positional [`Anchor`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{values::collapse_whitespace, workbook::CellData};

/// Header-row auto-detection bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDetection {
    pub min_non_empty: usize,
    pub max_scan: usize,
}

impl Default for HeaderDetection {
    fn default() -> Self {
        Self {
            min_non_empty: 3,
            max_scan: 10,
        }
    }
}

/// Positional preference used when a header text occurs more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    None,
    After(usize),
    Before(usize),
}

impl Anchor {
    pub fn after(index: Option<usize>) -> Self {
        index.map_or(Anchor::None, Anchor::After)
    }

    pub fn before(index: Option<usize>) -> Self {
        index.map_or(Anchor::None, Anchor::Before)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DmwField {
    SourceTable,
    SourceColumn,
    DestTable,
    DestColumn,
    Migrating,
    Reason,
    DataType,
    DataLength,
    Precision,
    Scale,
    Nullable,
    Transformation,
    IntroducedSprint,
    LastUpdatedSprint,
    ChangeLog,
}

impl DmwField {
    pub const ALL: [DmwField; 15] = [
        DmwField::SourceTable,
        DmwField::SourceColumn,
        DmwField::DestTable,
        DmwField::DestColumn,
        DmwField::Migrating,
        DmwField::Reason,
        DmwField::DataType,
        DmwField::DataLength,
        DmwField::Precision,
        DmwField::Scale,
        DmwField::Nullable,
        DmwField::Transformation,
        DmwField::IntroducedSprint,
        DmwField::LastUpdatedSprint,
        DmwField::ChangeLog,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DmwField::SourceTable => "Source Table",
            DmwField::SourceColumn => "Source Column",
            DmwField::DestTable => "Destination Table",
            DmwField::DestColumn => "Destination Column",
            DmwField::Migrating => "Migrating",
            DmwField::Reason => "Reason for Not Migrating",
            DmwField::DataType => "Destination Data Type",
            DmwField::DataLength => "Destination Data Length",
            DmwField::Precision => "Destination Precision",
            DmwField::Scale => "Destination Scale",
            DmwField::Nullable => "Destination Nullable",
            DmwField::Transformation => "Transformation Logic",
            DmwField::IntroducedSprint => "Introduced Sprint",
            DmwField::LastUpdatedSprint => "Last Updated Sprint",
            DmwField::ChangeLog => "Change Log",
        }
    }

    /// Accepted header spellings, most specific first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            DmwField::SourceTable => &["SOURCE TABLE", "SOURCE TABLE NAME"],
            DmwField::SourceColumn => &["SOURCE COLUMN NAME", "SOURCE COLUMN", "SOURCE FIELD NAME"],
            DmwField::DestTable => &[
                "DESTINATION TABLE",
                "DESTINATION TABLE NAME",
                "TARGET TABLE NAME",
                "TARGET TABLE",
            ],
            DmwField::DestColumn => &[
                "DESTINATION COLUMN NAME",
                "DESTINATION COLUMN",
                "TARGET FIELD NAME",
                "TARGET FIELD",
            ],
            DmwField::Migrating => &["MIGRATING COLUMN", "MIGRATING OR NOT (YES/NO)", "MIGRATING"],
            DmwField::Reason => &["REASON FOR NOT MIGRATING", "REASON"],
            DmwField::DataType => &["DESTINATION DATA TYPE", "DATATYPE (DESTINATION)", "DATA TYPE"],
            DmwField::DataLength => &[
                "DESTINATION DATA LENGTH",
                "MAX LENGTH (IN CHARS)",
                "MAX LENGTH",
                "DATA LENGTH",
            ],
            DmwField::Precision => &["DESTINATION PRECISION", "PRECISION (DESTINATION)", "PRECISION"],
            DmwField::Scale => &["DESTINATION SCALE", "SCALE (DESTINATION)", "SCALE"],
            DmwField::Nullable => &["DESTINATION NULLABLE", "IS IT NULLABLE? YES/NO", "NULLABLE"],
            DmwField::Transformation => &[
                "TRANSFORMATION LOGIC",
                "TRANSFORMATION DESCRIPTION (TRANSFORMATION LOGIC)",
                "TRANSFORMATION DESCRIPTION",
                "TRANSFORMATION",
                "LOGIC",
            ],
            DmwField::IntroducedSprint => &[
                "INTRODUCED SPRINT",
                "INTRODUCED SPRINT (FOR DATA MIGRATION SPRINT)",
            ],
            DmwField::LastUpdatedSprint => &[
                "LAST UPDATED SPRINT",
                "LAST UPDATED IN SPRINT",
                "LAST UPDATED IN SPRINT/PASS",
            ],
            DmwField::ChangeLog => &[
                "CHANGE LOG",
                "CHANGE LOG (FOR DATA MIGRATION REFERENCE)",
                "CHANG LOG (FOR DATA MIGRATION REFERENCE)",
                "CHANG LOG",
            ],
        }
    }
}

/// Table-name column of the "Table Details" sheet.
pub const TABLE_NAME_ALIASES: &[&str] = &["TABLE NAME", "DESTINATION TABLE", "TABLE"];

pub fn normalize_header(text: &str) -> String {
    collapse_whitespace(&text.replace(['_', '-'], " ")).to_uppercase()
}

/// Picks the header row within the first `max_scan` rows.
///
/// A row with enough non-empty cells that also names a source or destination
/// table wins. Otherwise the first row with enough non-empty cells is used,
/// and row 0 when nothing qualifies.
pub fn detect_header_row(rows: &[Vec<CellData>], detection: &HeaderDetection) -> usize {
    let window = rows.iter().take(detection.max_scan.max(1)).enumerate();
    let mut first_dense = None;
    for (idx, row) in window {
        let non_empty = row.iter().filter(|cell| !cell.is_blank()).count();
        if non_empty < detection.min_non_empty.max(1) {
            continue;
        }
        if row.iter().any(|cell| is_anchor_header(&cell.value)) {
            return idx;
        }
        first_dense.get_or_insert(idx);
    }
    first_dense.unwrap_or(0)
}

fn is_anchor_header(text: &str) -> bool {
    let normalized = normalize_header(text);
    DmwField::SourceTable
        .aliases()
        .iter()
        .chain(DmwField::DestTable.aliases())
        .any(|alias| *alias == normalized)
}

#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: Vec<String>,
    lookup: HashMap<String, Vec<usize>>,
}

impl HeaderIndex {
    /// Trailing blank header cells are dropped; interior blanks are kept so
    /// positions still line up with the data rows.
    pub fn build(header_row: &[String]) -> Self {
        let width = header_row
            .iter()
            .rposition(|text| !text.trim().is_empty())
            .map_or(0, |last| last + 1);
        let columns: Vec<String> = header_row[..width]
            .iter()
            .map(|text| text.trim().to_string())
            .collect();
        let mut lookup: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, text) in columns.iter().enumerate() {
            let key = normalize_header(text);
            if !key.is_empty() {
                lookup.entry(key).or_default().push(idx);
            }
        }
        Self { columns, lookup }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn positions(&self, header: &str) -> &[usize] {
        self.lookup
            .get(&normalize_header(header))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn resolve(&self, field: DmwField, anchor: Anchor) -> Option<usize> {
        self.resolve_any(field.aliases(), anchor)
    }

    /// Resolves the first alias with an occurrence on the anchored side.
    ///
    /// A source-side "Max Length" must not shadow a destination-side
    /// "Max Length (in chars)", so aliases are tried in order against the
    /// anchor before falling back to the first alias that occurs at all.
    pub fn resolve_any(&self, aliases: &[&str], anchor: Anchor) -> Option<usize> {
        let hits: Vec<&[usize]> = aliases
            .iter()
            .map(|alias| self.positions(alias))
            .filter(|hits| !hits.is_empty())
            .collect();
        hits.iter()
            .find_map(|hits| pick_on_side(hits, anchor))
            .or_else(|| pick_anchored(hits.first()?, anchor))
    }

    /// First column whose normalized header contains `needle`.
    pub fn find_containing(&self, needle: &str) -> Option<usize> {
        let needle = normalize_header(needle);
        self.columns
            .iter()
            .position(|text| normalize_header(text).contains(&needle))
    }
}

/// Nearest occurrence on the anchored side, if any.
fn pick_on_side(hits: &[usize], anchor: Anchor) -> Option<usize> {
    match anchor {
        Anchor::None => hits.first().copied(),
        Anchor::After(anchor) => hits.iter().copied().filter(|idx| *idx > anchor).min(),
        Anchor::Before(anchor) => hits.iter().copied().filter(|idx| *idx < anchor).max(),
    }
}

fn pick_anchored(hits: &[usize], anchor: Anchor) -> Option<usize> {
    if hits.len() == 1 {
        return hits.first().copied();
    }
    pick_on_side(hits, anchor).or_else(|| match anchor {
        Anchor::Before(_) => hits.first().copied(),
        _ => hits.last().copied(),
    })
}

/// Canonical field positions of one mapping sheet, resolved once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DmwColumns {
    indices: [Option<usize>; DmwField::ALL.len()],
}

impl DmwColumns {
    pub fn resolve(index: &HeaderIndex) -> Self {
        let mut columns = Self::default();
        let dest_column = index.resolve(DmwField::DestColumn, Anchor::None);
        for field in DmwField::ALL {
            let anchor = match field {
                DmwField::DataType
                | DmwField::DataLength
                | DmwField::Precision
                | DmwField::Scale
                | DmwField::Nullable => Anchor::after(dest_column),
                _ => Anchor::None,
            };
            columns.indices[field as usize] = index.resolve(field, anchor);
        }
        columns
    }

    pub fn get(&self, field: DmwField) -> Option<usize> {
        self.indices[field as usize]
    }

    /// Trimmed cell text of `field`, empty when the column or cell is absent.
    pub fn value<'a>(&self, field: DmwField, row: &'a [CellData]) -> &'a str {
        self.get(field)
            .and_then(|idx| row.get(idx))
            .map(|cell| cell.value.trim())
            .unwrap_or("")
    }

    pub fn resolved(&self) -> impl Iterator<Item = (DmwField, Option<usize>)> + '_ {
        DmwField::ALL.iter().map(|field| (*field, self.get(*field)))
    }
}
