use crate::config::Config;
use crate::error::LoadError;
use crate::util::delimiter_byte;
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;
use tracing::{debug, info};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A decoded CSV export: trimmed header names and raw cell text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// Decodes an export. A UTF-8 byte-order mark is authoritative; otherwise the
/// legacy encoding is tried before UTF-8.
pub fn decode(bytes: &[u8], legacy_label: &str) -> Result<Decoded, LoadError> {
    let legacy = Encoding::for_label(legacy_label.trim().as_bytes())
        .ok_or_else(|| LoadError::UnknownEncoding(legacy_label.to_string()))?;

    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(rest) {
            return Ok(Decoded {
                text: text.into_owned(),
                encoding: UTF_8.name(),
            });
        }
    }

    // Non-ASCII text that is also well-formed UTF-8 was written as UTF-8:
    // legacy exports put accented letters on single bytes, which never pair
    // up into valid multi-byte sequences.
    let multibyte_utf8 = !bytes.is_ascii() && Encoding::utf8_valid_up_to(bytes) == bytes.len();

    if multibyte_utf8 {
        debug!("input is multi-byte UTF-8; skipping {}", legacy.name());
    } else if let Some(text) = legacy.decode_without_bom_handling_and_without_replacement(bytes) {
        // C1 controls never occur in real legacy text; their presence means
        // the bytes were not written in this encoding.
        if !text.chars().any(|c| ('\u{80}'..='\u{9f}').contains(&c)) {
            return Ok(Decoded {
                text: text.into_owned(),
                encoding: legacy.name(),
            });
        }
        debug!("{} decode produced C1 controls; retrying as UTF-8", legacy.name());
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return Ok(Decoded {
            text: text.into_owned(),
            encoding: UTF_8.name(),
        });
    }

    Err(LoadError::Undecodable {
        legacy: legacy.name().to_string(),
    })
}

pub fn parse_csv(text: &str, delimiter: char) -> Result<Table, LoadError> {
    let delimiter = delimiter_byte(delimiter).ok_or(LoadError::Delimiter(delimiter))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(headers.len().max(row.len()), String::new());
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

pub fn read_table(cfg: &Config, bytes: &[u8]) -> Result<Table, LoadError> {
    let decoded = decode(bytes, &cfg.ingest.legacy_encoding)?;
    let table = parse_csv(&decoded.text, cfg.ingest.delimiter)?;
    debug!(
        "decoded as {} headers={:?} rows={}",
        decoded.encoding,
        table.headers,
        table.rows.len()
    );
    Ok(table)
}

pub fn load_table(cfg: &Config, path: &Path) -> Result<Table, LoadError> {
    let bytes = std::fs::read(path)?;
    let table = read_table(cfg, &bytes)?;
    info!("loaded {} rows from {}", table.rows.len(), path.display());
    Ok(table)
}
