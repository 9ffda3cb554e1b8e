//! Spreadsheet loading into an in-memory grid.
//!
//! Workbooks are read with `umya-spreadsheet` rather than a value-only reader
//! because cancelled rows are marked with a strikethrough font, which only the
//! style-preserving reader exposes. Every sheet becomes a rectangular grid of
//! [`CellData`] so the validation engine never touches the xlsx model.

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::values::normalize_identifier;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("workbook {path:?} does not exist")]
    NotFound { path: PathBuf },
    #[error("unable to read workbook {path:?}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("sheet '{name}' not found; available sheets: {available}")]
    MissingSheet { name: String, available: String },
    #[error("workbook contains no sheets")]
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    pub value: String,
    pub strike: bool,
}

impl CellData {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            strike: false,
        }
    }

    pub fn struck(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            strike: true,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellData>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellData>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a sheet of plain (non-struck) cells.
    pub fn from_values<R, C>(name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| CellData::new(value.as_ref()))
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    pub fn row_values(&self, index: usize) -> Vec<String> {
        self.rows
            .get(index)
            .map(|row| row.iter().map(|cell| cell.value.trim().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    active: usize,
}

impl Workbook {
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets, active: 0 }
    }

    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        if !path.exists() {
            return Err(WorkbookError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|err| WorkbookError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        let active_name = book.get_active_sheet().get_name().to_string();
        let mut sheets = Vec::new();
        for worksheet in book.get_sheet_collection() {
            sheets.push(read_worksheet(worksheet));
        }
        if sheets.is_empty() {
            return Err(WorkbookError::Empty);
        }
        let active = sheets
            .iter()
            .position(|sheet| sheet.name == active_name)
            .unwrap_or(0);
        debug!(
            "Loaded {:?}: {} sheet(s), active '{}'",
            path,
            sheets.len(),
            sheets[active].name
        );
        Ok(Self { sheets, active })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Looks a sheet up by name, ignoring case, spacing and underscores.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        let wanted = sheet_key(name);
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .or_else(|| self.sheets.iter().find(|sheet| sheet_key(&sheet.name) == wanted))
    }

    /// The named sheet, or the workbook's active sheet when no name is given.
    pub fn main_sheet(&self, name: Option<&str>) -> Result<&Sheet, WorkbookError> {
        match name {
            Some(name) => self.sheet(name).ok_or_else(|| WorkbookError::MissingSheet {
                name: name.to_string(),
                available: self.sheet_names().join(", "),
            }),
            None => self.sheets.get(self.active).ok_or(WorkbookError::Empty),
        }
    }
}

fn sheet_key(name: &str) -> String {
    normalize_identifier(name)
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .collect()
}

fn read_worksheet(worksheet: &umya_spreadsheet::Worksheet) -> Sheet {
    let (max_col, max_row) = worksheet.get_highest_column_and_row();
    let mut rows = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let mut cells = Vec::with_capacity(max_col as usize);
        for col in 1..=max_col {
            let cell = match worksheet.get_cell((col, row)) {
                Some(cell) => CellData {
                    value: cell.get_value().to_string(),
                    strike: cell
                        .get_style()
                        .get_font()
                        .map(|font| *font.get_strikethrough())
                        .unwrap_or(false),
                },
                None => CellData::default(),
            };
            cells.push(cell);
        }
        rows.push(cells);
    }
    Sheet::new(worksheet.get_name(), rows)
}
