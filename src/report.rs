//! Plain-text tables for the console.

use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    ddl::TableSchema,
    headers::{DmwColumns, HeaderIndex},
    validate::ValidationReport,
};

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().max(3)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(clean(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_row(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let value = values.get(idx).map(|v| clean(v)).unwrap_or_default();
            format!("{value:<width$}")
        })
        .join("  ");
    line.trim_end().to_string()
}

fn clean(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn render_schema(schema: &TableSchema) -> String {
    let rows: Vec<Vec<String>> = schema
        .tables()
        .flat_map(|(table, columns)| {
            columns.iter().map(move |(column, def)| {
                vec![
                    table.clone(),
                    column.clone(),
                    def.data_type.clone(),
                    def.nullable.to_string(),
                ]
            })
        })
        .collect();
    render_table(&strings(&["Table", "Column", "Type", "Nullable"]), &rows)
}

pub fn render_headers(header_row: usize, index: &HeaderIndex, columns: &DmwColumns) -> String {
    let mut output = format!("Header row: {}\n\n", header_row + 1);
    let rows: Vec<Vec<String>> = columns
        .resolved()
        .map(|(field, position)| match position {
            Some(idx) => vec![
                field.label().to_string(),
                (idx + 1).to_string(),
                index.columns()[idx].clone(),
            ],
            None => vec![field.label().to_string(), "-".to_string(), "(not found)".to_string()],
        })
        .collect();
    output.push_str(&render_table(&strings(&["Field", "Column", "Header"]), &rows));
    output
}

pub fn render_summary(report: &ValidationReport) -> String {
    let rows: Vec<Vec<String>> = report
        .summary
        .lines
        .iter()
        .map(|line| {
            vec![
                line.label.clone(),
                line.pass.to_string(),
                line.fail.to_string(),
                line.not_applicable.to_string(),
                line.total().to_string(),
            ]
        })
        .collect();
    render_table(&strings(&["Rule", "PASS", "FAIL", "N/A", "Total"]), &rows)
}

pub fn print_summary(report: &ValidationReport) {
    print!("{}", render_summary(report));
}
