//! I/O helpers for SQL text inputs.
//!
//! DDL files come from many tools: SQL Server Management Studio saves UTF-16
//! with a byte-order mark, hand-edited scripts are UTF-8 (with or without BOM)
//! and older exports are Latin-1. Decoding therefore never fails; it sniffs the
//! BOM, tries strict UTF-8 and falls back to Windows-1252 (the WHATWG superset
//! of Latin-1).

use std::{fs, path::Path};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use log::{debug, warn};

#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    pub had_errors: bool,
}

pub fn decode_sql_bytes(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            encoding,
            had_errors,
        };
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText {
            text: text.to_string(),
            encoding: UTF_8,
            had_errors: false,
        },
        Err(_) => {
            let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            DecodedText {
                text: text.into_owned(),
                encoding: WINDOWS_1252,
                had_errors,
            }
        }
    }
}

pub fn read_sql_file(path: &Path) -> Result<DecodedText> {
    let bytes = fs::read(path).with_context(|| format!("Reading SQL file {path:?}"))?;
    let decoded = decode_sql_bytes(&bytes);
    debug!(
        "Decoded {:?} as {} ({} bytes)",
        path,
        decoded.encoding.name(),
        bytes.len()
    );
    if decoded.had_errors {
        warn!(
            "{:?} contained byte sequences invalid for {}; they were replaced",
            path,
            decoded.encoding.name()
        );
    }
    Ok(decoded)
}
