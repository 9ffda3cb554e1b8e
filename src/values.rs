//! Cell-value normalization shared by every rule.
//!
//! Workbook cells arrive as free text typed by business users. Everything that
//! compares identifiers or flags goes through this module so that the null
//! sentinel (`""`, `NA`, `N/A`, `NIL`) and the upper-cased identifier form are
//! applied consistently.

use std::fmt;

const NULL_SENTINELS: &[&str] = &["", "NA", "N/A", "NIL"];

/// Returns `true` when the value is empty or one of the null sentinels.
pub fn is_null_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    NULL_SENTINELS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
}

/// Returns the trimmed value, or `None` for the null sentinel.
pub fn non_null(value: &str) -> Option<&str> {
    if is_null_sentinel(value) {
        None
    } else {
        Some(value.trim())
    }
}

/// Upper-cases an identifier and strips `[]`, `"` and `` ` `` delimiters.
pub fn normalize_identifier(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '[' | ']' | '"' | '`'))
        .collect::<String>()
        .trim()
        .to_uppercase()
}

/// Normalizes a table reference, dropping any schema/database qualifier.
pub fn normalize_table(value: &str) -> String {
    let normalized = normalize_identifier(value);
    match normalized.rsplit_once('.') {
        Some((_, name)) => name.trim().to_string(),
        None => normalized,
    }
}

/// Collapses runs of whitespace into a single space and trims the ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "Y" | "YES" | "TRUE" | "1" => Some(YesNo::Yes),
            "N" | "NO" | "FALSE" | "0" => Some(YesNo::No),
            _ => None,
        }
    }
}

/// Nullability of a destination column, as declared in DDL or in the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Nullability {
    NotNull,
    Null,
    #[default]
    Unspecified,
}

impl Nullability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nullability::NotNull => "NOT NULL",
            Nullability::Null => "NULL",
            Nullability::Unspecified => "",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Nullability::Unspecified)
    }

    /// Interprets a workbook "nullable" cell. The column is phrased as
    /// "Is it Nullable?", so `Yes` means the column accepts NULLs.
    pub fn from_dmw(value: &str) -> Self {
        let collapsed = collapse_whitespace(value).to_ascii_uppercase();
        match collapsed.as_str() {
            "NOT NULL" | "NOTNULL" | "NON NULL" => Nullability::NotNull,
            "NULL" | "NULLABLE" => Nullability::Null,
            other => match YesNo::parse(other) {
                Some(YesNo::Yes) => Nullability::Null,
                Some(YesNo::No) => Nullability::NotNull,
                None => Nullability::Unspecified,
            },
        }
    }
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
