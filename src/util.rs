use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use unicode_normalization::UnicodeNormalization;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    format!("{:x}", h.finalize())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Canonical form of a worker identity: NFC, single spaces, trimmed.
///
/// The weekly and monthly exports do not always agree on accent composition
/// or spacing, and identities are the join key between them.
pub fn identity_key(s: &str) -> String {
    s.nfc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive form of [`identity_key`], used for header matching.
pub fn folded(s: &str) -> String {
    identity_key(s).to_lowercase()
}

/// CSV delimiters are single bytes; only ASCII keeps that byte identical in
/// the UTF-8 text the reader and writer see.
pub fn delimiter_byte(c: char) -> Option<u8> {
    c.is_ascii().then_some(c as u8)
}
