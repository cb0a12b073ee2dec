//! Parsing of the participant email import sheet.
//!
//! The sheet is CSV with the email address in the second column. Parsing
//! classifies every data row; persistence and duplicate handling against the
//! registry happen in the caller.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Zero-based index of the email column in the import sheet.
pub const EMAIL_ADDRESS_COLUMN: usize = 1;

/// Header expected over the email column, compared ignoring case.
pub const EMAIL_ADDRESS_HEADER: &str = "Email Address";

/// Pattern an email address must match to be importable.
pub const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

/// Compiled email pattern. Compiled once, reused forever.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

/// Whether a string is an importable email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

// ---------------------------------------------------------------------------
// Sheet parsing
// ---------------------------------------------------------------------------

/// The classified contents of an import sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportSheet {
    /// Well-formed addresses, de-duplicated, in first-occurrence order.
    pub valid_emails: Vec<String>,
    /// Malformed or blank cells, de-duplicated, in first-occurrence order.
    pub invalid_emails: Vec<String>,
}

/// Why an import sheet could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The header row is missing or its email column is not
    /// [`EMAIL_ADDRESS_HEADER`].
    #[error("import sheet header does not match the prescribed format")]
    HeaderMismatch,
    /// The upload could not be read as CSV.
    #[error("failed to read the import sheet")]
    Unreadable(#[from] csv::Error),
}

/// Parse an uploaded import sheet.
///
/// The first row must carry [`EMAIL_ADDRESS_HEADER`] over the email column
/// (case-insensitive, surrounding whitespace ignored). Every following row
/// contributes its email cell: blank and malformed values are collected as
/// invalid, well-formed ones as valid, both de-duplicated in order of first
/// occurrence.
pub fn parse_email_sheet(bytes: &[u8]) -> Result<ImportSheet, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Err(ImportError::HeaderMismatch),
    };
    let header_cell = header.get(EMAIL_ADDRESS_COLUMN).unwrap_or("").trim();
    if !header_cell.eq_ignore_ascii_case(EMAIL_ADDRESS_HEADER) {
        return Err(ImportError::HeaderMismatch);
    }

    let mut sheet = ImportSheet::default();
    let mut seen_valid: HashSet<String> = HashSet::new();
    let mut seen_invalid: HashSet<String> = HashSet::new();
    for record in records {
        let record = record?;
        let cell = record.get(EMAIL_ADDRESS_COLUMN).unwrap_or("").trim();
        if !is_valid_email(cell) {
            if seen_invalid.insert(cell.to_string()) {
                sheet.invalid_emails.push(cell.to_string());
            }
        } else if seen_valid.insert(cell.to_string()) {
            sheet.valid_emails.push(cell.to_string());
        }
    }
    Ok(sheet)
}
