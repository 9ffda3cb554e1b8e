//! Destination (table, column) keys and definitions collected from a mapping sheet.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use log::debug;

use crate::{
    classify::{RowKind, classify_row},
    headers::{DmwColumns, DmwField, HeaderDetection, HeaderIndex, detect_header_row},
    sql_types::SqlType,
    values::{Nullability, non_null, normalize_identifier, normalize_table},
    workbook::{CellData, Sheet},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestKey {
    pub table: String,
    pub column: String,
}

impl DestKey {
    pub fn new(table: &str, column: &str) -> Self {
        Self {
            table: normalize_table(table),
            column: normalize_identifier(column),
        }
    }

    /// Key of a row, or `None` when either identifier is a null sentinel.
    pub fn from_row(columns: &DmwColumns, row: &[CellData]) -> Option<Self> {
        let table = non_null(columns.value(DmwField::DestTable, row))?;
        let column = non_null(columns.value(DmwField::DestColumn, row))?;
        Some(Self::new(table, column))
    }
}

impl fmt::Display for DestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Destination attributes declared by the workbook for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestDef {
    pub data_type: String,
    pub nullable: Nullability,
    pub transform: String,
}

impl DestDef {
    pub fn from_row(columns: &DmwColumns, row: &[CellData]) -> Self {
        Self {
            data_type: declared_type(columns, row)
                .map(|ty| ty.to_string())
                .unwrap_or_default(),
            nullable: Nullability::from_dmw(columns.value(DmwField::Nullable, row)),
            transform: non_null(columns.value(DmwField::Transformation, row))
                .unwrap_or_default()
                .to_string(),
        }
    }

    pub fn sql_type(&self) -> Option<SqlType> {
        SqlType::parse(&self.data_type)
    }
}

/// Destination type of a row with the separate length, precision and scale
/// columns folded into its parameters.
///
/// Numeric types take precision and scale ahead of the length column. Other
/// types only take the length column.
pub fn declared_type(columns: &DmwColumns, row: &[CellData]) -> Option<SqlType> {
    let ty = SqlType::parse(non_null(columns.value(DmwField::DataType, row))?)?;
    let length = non_null(columns.value(DmwField::DataLength, row));
    if ty.is_numeric() {
        let precision = non_null(columns.value(DmwField::Precision, row));
        let scale = non_null(columns.value(DmwField::Scale, row));
        Some(ty.with_precision(precision, scale).with_length(length))
    } else {
        Some(ty.with_length(length))
    }
}

/// `table → {column}` view used for set differences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestKeySet {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl DestKeySet {
    pub fn insert(&mut self, key: &DestKey) {
        self.tables
            .entry(key.table.clone())
            .or_default()
            .insert(key.column.clone());
    }

    pub fn contains(&self, key: &DestKey) -> bool {
        self.tables
            .get(&key.table)
            .is_some_and(|columns| columns.contains(&key.column))
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn columns(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(table)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.tables.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = DestKey> + '_ {
        self.tables.iter().flat_map(|(table, columns)| {
            columns.iter().map(move |column| DestKey {
                table: table.clone(),
                column: column.clone(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Keys plus definitions of every active row of a mapping sheet. The first
/// definition seen for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationCatalog {
    pub keys: DestKeySet,
    pub defs: BTreeMap<DestKey, DestDef>,
}

impl DestinationCatalog {
    pub fn record(&mut self, key: DestKey, def: DestDef) {
        self.keys.insert(&key);
        self.defs.entry(key).or_insert(def);
    }

    pub fn from_sheet(sheet: &Sheet, detection: &HeaderDetection) -> Self {
        let header_row = detect_header_row(&sheet.rows, detection);
        let index = HeaderIndex::build(&sheet.row_values(header_row));
        let columns = DmwColumns::resolve(&index);
        let mut catalog = Self::default();
        for row in sheet.rows.iter().skip(header_row + 1) {
            if classify_row(&columns, row) != RowKind::Active {
                continue;
            }
            if let Some(key) = DestKey::from_row(&columns, row) {
                catalog.record(key, DestDef::from_row(&columns, row));
            }
        }
        debug!(
            "Sheet '{}': {} destination key(s) across {} table(s)",
            sheet.name,
            catalog.keys.len(),
            catalog.keys.tables().count()
        );
        catalog
    }
}
