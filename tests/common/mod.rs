#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dmw_validator::workbook::{CellData, Sheet};
use tempfile::{TempDir, tempdir};

/// Header of the current mapping template.
pub const DMW_HEADER: [&str; 13] = [
    "Source Table",
    "Source Column Name",
    "Destination Table",
    "Destination Column Name",
    "Migrating Column",
    "Reason for Not Migrating",
    "Destination Data Type",
    "Destination Data Length",
    "Destination Nullable",
    "Transformation Logic",
    "Introduced Sprint",
    "Last Updated Sprint",
    "Change Log",
];

/// A mapping row in `DMW_HEADER` order. Sprint columns are left blank.
pub fn dmw_row(
    dest_table: &str,
    dest_column: &str,
    migrating: &str,
    data_type: &str,
    nullable: &str,
    logic: &str,
) -> Vec<String> {
    [
        "SRC_TABLE",
        dest_column,
        dest_table,
        dest_column,
        migrating,
        "",
        data_type,
        "",
        nullable,
        logic,
        "",
        "",
        "",
    ]
    .iter()
    .map(|v| v.to_string())
    .collect()
}

pub fn header_row() -> Vec<String> {
    DMW_HEADER.iter().map(|h| h.to_string()).collect()
}

/// In-memory mapping sheet: a title row, the header and `rows`.
pub fn dmw_sheet(name: &str, rows: &[Vec<String>]) -> Sheet {
    let mut all = vec![vec!["Data Mapping Workbook".to_string()], header_row()];
    all.extend(rows.iter().cloned());
    Sheet::from_values(name, all)
}

/// Returns the cells of `sheet` with every cell of `row` struck through.
pub fn strike_row(mut sheet: Sheet, row: usize) -> Sheet {
    if let Some(cells) = sheet.rows.get_mut(row) {
        for cell in cells.iter_mut() {
            cell.strike = true;
        }
    }
    sheet
}

pub fn cell(value: &str) -> CellData {
    CellData::new(value)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Saves `sheets` as an xlsx file; the first sheet is the active one.
    pub fn write_workbook(&self, name: &str, sheets: &[Sheet]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for sheet in sheets {
            let worksheet = book.new_sheet(sheet.name.as_str()).expect("add sheet");
            for (r, row) in sheet.rows.iter().enumerate() {
                for (c, data) in row.iter().enumerate() {
                    let coordinate = (c as u32 + 1, r as u32 + 1);
                    if !data.value.is_empty() {
                        worksheet
                            .get_cell_mut(coordinate)
                            .set_value_string(data.value.as_str());
                    }
                    if data.strike {
                        worksheet
                            .get_cell_mut(coordinate)
                            .get_style_mut()
                            .get_font_mut()
                            .set_strikethrough(true);
                    }
                }
            }
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).expect("write workbook");
        path
    }
}
