//! Lightweight `CREATE TABLE` parser.
//!
//! This is not a SQL parser. It finds each `CREATE TABLE [schema.]name (`,
//! walks the parenthesis depth to the matching close to get the column block,
//! splits the block on top-level commas and reads `name type [NULL|NOT NULL]`
//! out of every clause that is not a constraint, index or period definition.
//!
//! Hand-maintained DDL is irregular (trailing commas, vendor clauses, missing
//! semicolons), so a clause that does not look like a column definition is
//! dropped and the rest of the table is kept. Parsing never fails.

use std::{
    collections::BTreeMap,
    path::Path,
    sync::LazyLock,
};

use anyhow::Result;
use log::{debug, info};
use regex::Regex;

use crate::{
    io_utils,
    sql_types::SqlType,
    values::{Nullability, normalize_identifier, normalize_table},
};

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)\bCREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:\[[^\]]+\]|"[^"]+"|`[^`]+`|[A-Za-z0-9_#$@]+)(?:\s*\.\s*(?:\[[^\]]+\]|"[^"]+"|`[^`]+`|[A-Za-z0-9_#$@]+))*)\s*\("#,
    )
    .expect("valid CREATE TABLE pattern")
});

static COLUMN_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)^(\[[^\]]+\]|"[^"]+"|`[^`]+`|[^\s(),]+)\s*(.*)$"#)
        .expect("valid column head pattern")
});

static TYPE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(\[?[A-Za-z_][A-Za-z0-9_]*\]?(?:\s+(?:PRECISION|VARYING|WITH(?:OUT)?\s+TIME\s+ZONE)\b)?)\s*(\([^()]*\))?",
    )
    .expect("valid type pattern")
});

static COLLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCOLLATE\s+\S+").expect("valid COLLATE pattern"));

static IDENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bIDENTITY\b").expect("valid IDENTITY pattern"));

static NOT_NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").expect("valid NOT NULL pattern"));

static NULL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNULL\b").expect("valid NULL pattern"));

static PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").expect("valid PRIMARY KEY pattern"));

/// Single-word clause openers that never start a column definition.
const SKIP_KEYWORDS: &[&str] = &[
    "CONSTRAINT", "CHECK", "UNIQUE", "INDEX", "KEY", "WITH", "FULLTEXT", "SPATIAL",
];

/// Two-word clause openers (`PRIMARY KEY`, `FOREIGN KEY`, `PERIOD FOR SYSTEM_TIME`).
const SKIP_KEYWORD_PAIRS: &[(&str, &str)] = &[("PRIMARY", "KEY"), ("FOREIGN", "KEY"), ("PERIOD", "FOR")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub data_type: String,
    pub nullable: Nullability,
}

impl ColumnDef {
    pub fn new(data_type: impl Into<String>, nullable: Nullability) -> Self {
        Self {
            data_type: data_type.into(),
            nullable,
        }
    }

    pub fn sql_type(&self) -> Option<SqlType> {
        SqlType::parse(&self.data_type)
    }

    /// Nullability as the database applies it: a column declared without
    /// `NULL` or `NOT NULL` accepts NULLs.
    pub fn effective_nullability(&self) -> Nullability {
        match self.nullable {
            Nullability::Unspecified => Nullability::Null,
            declared => declared,
        }
    }
}

pub type TableColumns = BTreeMap<String, ColumnDef>;

/// Parsed destination schema: normalized table name to normalized column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    tables: BTreeMap<String, TableColumns>,
}

impl TableSchema {
    pub fn insert_table(&mut self, name: &str, columns: TableColumns) {
        self.tables.insert(normalize_table(name), columns);
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableColumns)> {
        self.tables.iter()
    }

    pub fn table(&self, name: &str) -> Option<&TableColumns> {
        self.tables.get(name)
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnDef> {
        self.tables.get(table).and_then(|columns| columns.get(column))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|columns| columns.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

pub fn load_ddl(path: &Path) -> Result<TableSchema> {
    let decoded = io_utils::read_sql_file(path)?;
    let schema = parse_ddl(&decoded.text);
    info!(
        "Parsed {} table(s) / {} column(s) from {:?}",
        schema.table_count(),
        schema.column_count(),
        path
    );
    Ok(schema)
}

pub fn parse_ddl_bytes(bytes: &[u8]) -> TableSchema {
    parse_ddl(&io_utils::decode_sql_bytes(bytes).text)
}

pub fn parse_ddl(sql_text: &str) -> TableSchema {
    let text = strip_sql_comments(sql_text);
    let mut schema = TableSchema::default();
    let mut cursor = 0usize;

    while let Some(captures) = CREATE_TABLE.captures_at(&text, cursor) {
        let Some(whole) = captures.get(0) else {
            break;
        };
        let raw_name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let open = whole.end() - 1;
        let (block, next) = match find_matching_paren(&text, open) {
            Some(close) => (&text[open + 1..close], close + 1),
            None => (&text[open + 1..], text.len()),
        };
        let table = normalize_table(raw_name);
        let columns = parse_column_block(&table, block);
        debug!("CREATE TABLE {table}: {} column(s)", columns.len());
        schema.tables.insert(table, columns);
        cursor = next.max(whole.end());
    }
    schema
}

fn parse_column_block(table: &str, block: &str) -> TableColumns {
    let mut columns = TableColumns::new();
    for clause in split_top_level(block) {
        let clause = clause.trim();
        if clause.is_empty() || is_non_column_clause(clause) {
            continue;
        }
        match parse_column_clause(clause) {
            Some((name, def)) => {
                columns.insert(name, def);
            }
            None => debug!("{table}: dropped unrecognised clause '{clause}'"),
        }
    }
    columns
}

fn is_non_column_clause(clause: &str) -> bool {
    let mut words = clause
        .split(|ch: char| ch.is_whitespace() || ch == '(')
        .filter(|word| !word.is_empty());
    let first = words.next().unwrap_or_default().to_ascii_uppercase();
    if SKIP_KEYWORDS.contains(&first.as_str()) {
        return true;
    }
    let second = words.next().unwrap_or_default().to_ascii_uppercase();
    SKIP_KEYWORD_PAIRS
        .iter()
        .any(|(a, b)| first == *a && second == *b)
}

fn parse_column_clause(clause: &str) -> Option<(String, ColumnDef)> {
    let head = COLUMN_HEAD.captures(clause)?;
    let name = normalize_identifier(head.get(1)?.as_str());
    if name.is_empty() {
        return None;
    }
    let rest = head.get(2).map(|m| m.as_str()).unwrap_or_default();
    if is_computed(rest) {
        return None;
    }

    let ty = TYPE_TOKEN.captures(rest)?;
    let type_match = ty.get(0)?;
    let base = ty.get(1)?.as_str();
    let params = ty.get(2).map(|m| m.as_str()).unwrap_or_default();
    let sql_type = SqlType::parse(&format!("{}{}", base.replace(['[', ']'], ""), params))?;

    let remainder = &rest[type_match.end()..];
    let nullable = detect_nullability(remainder);
    Some((name, ColumnDef::new(sql_type.to_string(), nullable)))
}

fn is_computed(rest: &str) -> bool {
    let upper = rest.trim_start().to_ascii_uppercase();
    upper == "AS"
        || upper.starts_with("AS ")
        || upper.starts_with("AS(")
        || upper.starts_with("AS\t")
        || upper.starts_with("AS\n")
}

fn detect_nullability(remainder: &str) -> Nullability {
    let without_groups = remove_quoted_and_grouped(remainder);
    let without_collate = COLLATE.replace_all(&without_groups, " ");
    let cleaned = IDENTITY.replace_all(&without_collate, " ");
    let implied_not_null = PRIMARY_KEY.is_match(&cleaned) && !NULL.is_match(&cleaned);
    if NOT_NULL.is_match(&cleaned) || implied_not_null {
        Nullability::NotNull
    } else if NULL.is_match(&cleaned) {
        Nullability::Null
    } else {
        Nullability::Unspecified
    }
}

/// Closing character of a string literal or delimited identifier opened by `ch`.
fn closing_delimiter(ch: char) -> Option<char> {
    match ch {
        '\'' => Some('\''),
        '"' => Some('"'),
        '`' => Some('`'),
        '[' => Some(']'),
        _ => None,
    }
}

/// Drops string literals, delimited identifiers and parenthesized groups
/// (defaults, check expressions, identity seeds) so their contents cannot
/// look like NULL flags.
fn remove_quoted_and_grouped(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut closing: Option<char> = None;
    for ch in text.chars() {
        if let Some(close) = closing {
            if ch == close {
                closing = None;
            }
            continue;
        }
        if let Some(close) = closing_delimiter(ch) {
            closing = Some(close);
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
        if depth > 0 || ch == ')' {
            // grouped content is replaced by a separator
            if !out.ends_with(' ') {
                out.push(' ');
            }
        }
    }
    out
}

/// Returns the byte index of the parenthesis closing the one at `open`.
pub fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut closing: Option<char> = None;
    for (idx, ch) in text.char_indices().filter(|(idx, _)| *idx >= open) {
        if let Some(close) = closing {
            if ch == close {
                closing = None;
            }
            continue;
        }
        if let Some(close) = closing_delimiter(ch) {
            closing = Some(close);
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas that are outside parentheses, string literals and
/// delimited identifiers.
pub fn split_top_level(block: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut closing: Option<char> = None;
    let mut start = 0usize;
    for (idx, ch) in block.char_indices() {
        if let Some(close) = closing {
            if ch == close {
                closing = None;
            }
            continue;
        }
        if let Some(close) = closing_delimiter(ch) {
            closing = Some(close);
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&block[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);
    parts
}

/// Removes `-- line` and `/* block */` comments outside string literals and
/// delimited identifiers.
pub fn strip_sql_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut closing: Option<char> = None;
    while let Some(ch) = chars.next() {
        if let Some(close) = closing {
            out.push(ch);
            if ch == close {
                closing = None;
            }
            continue;
        }
        if let Some(close) = closing_delimiter(ch) {
            closing = Some(close);
            out.push(ch);
            continue;
        }
        match ch {
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}
