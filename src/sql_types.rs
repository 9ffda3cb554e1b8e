//! SQL data-type text handling.
//!
//! Workbooks and DDL spell the same type many ways (`VARCHAR2(50)` vs
//! `varchar( 50 )`, `NUMBER` vs `DECIMAL`). [`SqlType`] splits a type into its
//! base name and parameter list, and [`types_compatible`] compares two types on
//! their canonical base name plus parameters.

use std::fmt;

use crate::values::collapse_whitespace;

const TYPE_ALIASES: &[(&str, &str)] = &[
    ("VARCHAR2", "VARCHAR"),
    ("NVARCHAR2", "NVARCHAR"),
    ("CHARACTER VARYING", "VARCHAR"),
    ("NCHAR VARYING", "NVARCHAR"),
    ("NUMBER", "DECIMAL"),
    ("NUMERIC", "DECIMAL"),
    ("MONEY", "DECIMAL"),
    ("SMALLMONEY", "DECIMAL"),
    ("INT", "INTEGER"),
    ("INT4", "INTEGER"),
    ("INT8", "BIGINT"),
    ("TINYINT", "SMALLINT"),
    ("DATETIME2", "DATETIME"),
    ("DATETIMEOFFSET", "DATETIME"),
    ("SMALLDATETIME", "DATETIME"),
    ("TIMESTAMP WITHOUT TIME ZONE", "TIMESTAMP"),
    ("TIMESTAMP WITH TIME ZONE", "TIMESTAMP"),
    ("BOOL", "BOOLEAN"),
    ("BIT", "BOOLEAN"),
    ("FLOAT4", "FLOAT"),
    ("FLOAT8", "DOUBLE"),
    ("DOUBLE PRECISION", "DOUBLE"),
];

/// Base types that are incomplete without a length or precision.
const LENGTH_REQUIRED: &[&str] = &[
    "CHAR",
    "NCHAR",
    "VARCHAR",
    "NVARCHAR",
    "VARCHAR2",
    "NVARCHAR2",
    "CHARACTER VARYING",
    "DECIMAL",
    "NUMERIC",
    "BINARY",
    "VARBINARY",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    pub base: String,
    pub params: Option<String>,
}

impl SqlType {
    /// Parses free-form type text. Returns `None` for blank input.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (base_text, params) = match trimmed.find('(') {
            Some(open) => {
                let close = trimmed.rfind(')').filter(|close| *close > open);
                let inner = match close {
                    Some(close) => &trimmed[open + 1..close],
                    None => &trimmed[open + 1..],
                };
                (&trimmed[..open], normalize_params(inner))
            }
            None => (trimmed, None),
        };
        let base = collapse_whitespace(base_text).to_ascii_uppercase();
        if base.is_empty() {
            return None;
        }
        Some(SqlType { base, params })
    }

    /// Attaches a separately supplied length/precision when the type has none.
    pub fn with_length(mut self, length: Option<&str>) -> Self {
        if self.params.is_none() {
            self.params = length.and_then(normalize_params);
        }
        self
    }

    /// Builds `precision[,scale]` from separate columns when the type has no
    /// parameters. A scale without a precision is ignored.
    pub fn with_precision(mut self, precision: Option<&str>, scale: Option<&str>) -> Self {
        if self.params.is_some() {
            return self;
        }
        let Some(precision) = precision.and_then(normalize_params) else {
            return self;
        };
        self.params = Some(match scale.and_then(normalize_params) {
            Some(scale) => format!("{precision},{scale}"),
            None => precision,
        });
        self
    }

    pub fn canonical_base(&self) -> &str {
        canonical_base(&self.base)
    }

    pub fn is_numeric(&self) -> bool {
        self.canonical_base() == "DECIMAL"
    }

    pub fn requires_length(&self) -> bool {
        LENGTH_REQUIRED.contains(&self.base.as_str())
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.params {
            Some(params) => write!(f, "{}({})", self.base, params),
            None => f.write_str(&self.base),
        }
    }
}

fn normalize_params(inner: &str) -> Option<String> {
    let compact: String = inner
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

pub fn canonical_base(base: &str) -> &str {
    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(base)
}

/// Same canonical base, and equal parameters when both sides specify them.
pub fn types_compatible(left: &SqlType, right: &SqlType) -> bool {
    if left.canonical_base() != right.canonical_base() {
        return false;
    }
    match (&left.params, &right.params) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_base_and_params() {
        let ty = SqlType::parse(" decimal ( 12, 3 ) ").expect("type");
        assert_eq!(ty.base, "DECIMAL");
        assert_eq!(ty.params.as_deref(), Some("12,3"));
        assert_eq!(ty.to_string(), "DECIMAL(12,3)");
        assert!(SqlType::parse("   ").is_none());
    }

    #[test]
    fn aliases_are_compatible() {
        let oracle = SqlType::parse("VARCHAR2(50)").unwrap();
        let mssql = SqlType::parse("varchar(50)").unwrap();
        assert!(types_compatible(&oracle, &mssql));
        let number = SqlType::parse("NUMBER").unwrap();
        let decimal = SqlType::parse("DECIMAL(10,2)").unwrap();
        assert!(types_compatible(&number, &decimal));
        let int = SqlType::parse("INT").unwrap();
        let bigint = SqlType::parse("BIGINT").unwrap();
        assert!(!types_compatible(&int, &bigint));
    }

    #[test]
    fn differing_params_are_incompatible() {
        let a = SqlType::parse("NVARCHAR(50)").unwrap();
        let b = SqlType::parse("NVARCHAR(100)").unwrap();
        assert!(!types_compatible(&a, &b));
    }

    #[test]
    fn separate_length_fills_missing_params() {
        let ty = SqlType::parse("VARCHAR").unwrap().with_length(Some(" 40 "));
        assert_eq!(ty.params.as_deref(), Some("40"));
        let kept = SqlType::parse("VARCHAR(10)").unwrap().with_length(Some("40"));
        assert_eq!(kept.params.as_deref(), Some("10"));
    }

    #[test]
    fn separate_precision_and_scale() {
        let ty = SqlType::parse("NUMBER").unwrap().with_precision(Some("12"), Some(" 2"));
        assert_eq!(ty.to_string(), "NUMBER(12,2)");
        assert!(ty.is_numeric());
        let no_scale = SqlType::parse("DECIMAL").unwrap().with_precision(Some("9"), None);
        assert_eq!(no_scale.params.as_deref(), Some("9"));
        let scale_only = SqlType::parse("DECIMAL").unwrap().with_precision(None, Some("2"));
        assert!(scale_only.params.is_none());
        let inline = SqlType::parse("DECIMAL(5,1)").unwrap().with_precision(Some("12"), Some("2"));
        assert_eq!(inline.params.as_deref(), Some("5,1"));
        assert!(!SqlType::parse("VARCHAR").unwrap().is_numeric());
    }
}
