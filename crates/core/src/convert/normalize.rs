//! Field-level value coercion
//!
//! Pure helpers that turn loosely-typed source scalars into the strictly
//! typed values the SIMO payload schemas expect. Malformed input never
//! raises: coercers return a [`SkipReason`] so callers (and tests) can see
//! why a value was dropped, and best-effort normalizations log a warning
//! instead of failing.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use simobridge_domain::SourceValue;
use tracing::{debug, warn};

/// Canonical output format for every date field (`dd/mm/yyyy`).
const CANONICAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// Alternate textual date formats, tried in order; first match wins.
///
/// Ambiguous strings (e.g. `01/02/2024`) resolve to the earliest matching
/// pattern. The ordering is a contract, not a heuristic.
const ALTERNATE_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d.%m.%Y", "%Y.%m.%d", "%d-%m-%y", "%d/%m/%y",
];

/// Mobile number prefixes assigned to Vietnamese carriers.
const VALID_MOBILE_PREFIXES: [&str; 5] = ["03", "05", "07", "08", "09"];

/// Expected length of a normalized Vietnamese mobile number.
const PHONE_LENGTH: usize = 10;

/// Why a source value was omitted from the converted record.
///
/// A skip is a normalization outcome, not an error; conversion always
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The value was absent or blank after trimming.
    Empty,
    /// An integer field received something that does not parse as a number.
    NotANumber,
    /// A date field matched none of the accepted representations.
    UnrecognizedDate,
}

impl SkipReason {
    /// Static string code for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::NotANumber => "NOT_A_NUMBER",
            Self::UnrecognizedDate => "UNRECOGNIZED_DATE",
        }
    }
}

/// Coerce a source value into a trimmed string, truncated to `max_len`
/// characters when a limit is declared.
pub fn coerce_string(
    value: &SourceValue,
    max_len: Option<usize>,
) -> Result<String, SkipReason> {
    let text = match value {
        SourceValue::Null => return Err(SkipReason::Empty),
        SourceValue::Text(s) => s.trim().to_string(),
        SourceValue::Number(n) => render_number(*n),
        SourceValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    if text.is_empty() {
        return Err(SkipReason::Empty);
    }

    Ok(truncate_chars(text, max_len))
}

/// Coerce a source value into an integer.
///
/// Parses through `f64` first so spreadsheet artifacts like `"3.0"` land on
/// `3`; the fractional part is truncated toward zero.
pub fn coerce_integer(value: &SourceValue) -> Result<i64, SkipReason> {
    let parsed = match value {
        SourceValue::Null => return Err(SkipReason::Empty),
        SourceValue::Number(n) => *n,
        SourceValue::DateTime(_) => return Err(SkipReason::NotANumber),
        SourceValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(SkipReason::Empty);
            }
            trimmed.parse::<f64>().map_err(|_| SkipReason::NotANumber)?
        }
    };

    if !parsed.is_finite() {
        return Err(SkipReason::NotANumber);
    }

    Ok(parsed.trunc() as i64)
}

/// Coerce a source value into the canonical `dd/mm/yyyy` date string.
///
/// Cascade, first match wins:
/// 1. already canonical — returned unchanged;
/// 2. a native date/time cell — formatted directly;
/// 3. the ordered [`ALTERNATE_DATE_FORMATS`] list;
/// 4. spreadsheet serial-date fallback: a positive number interpreted as a
///    day offset from 1899-12-30 (fractional days honored).
pub fn coerce_date(value: &SourceValue) -> Result<String, SkipReason> {
    match value {
        SourceValue::Null => Err(SkipReason::Empty),
        SourceValue::DateTime(dt) => Ok(dt.format(CANONICAL_DATE_FORMAT).to_string()),
        SourceValue::Number(n) => {
            serial_to_date(*n).ok_or(SkipReason::UnrecognizedDate)
        }
        SourceValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(SkipReason::Empty);
            }

            if NaiveDate::parse_from_str(trimmed, CANONICAL_DATE_FORMAT).is_ok() {
                return Ok(trimmed.to_string());
            }

            for format in ALTERNATE_DATE_FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                    return Ok(date.format(CANONICAL_DATE_FORMAT).to_string());
                }
            }

            if let Ok(serial) = trimmed.parse::<f64>() {
                if let Some(date) = serial_to_date(serial) {
                    return Ok(date);
                }
            }

            Err(SkipReason::UnrecognizedDate)
        }
    }
}

/// Normalize a phone number to the Vietnamese 10-digit mobile standard.
///
/// Idempotent: normalizing an already-normalized number is a no-op.
/// Out-of-shape inputs are repaired best-effort and logged, never rejected.
pub fn normalize_phone(raw: &str) -> String {
    let mut cleaned = strip_separators(raw);

    if let Some(rest) = cleaned.strip_prefix("+84") {
        cleaned = format!("0{rest}");
    } else if cleaned.starts_with("84") && cleaned.chars().count() >= PHONE_LENGTH {
        let rest: String = cleaned.chars().skip(2).collect();
        cleaned = format!("0{rest}");
    }

    if !cleaned.starts_with('0') {
        cleaned.insert(0, '0');
    }

    let prefix: String = cleaned.chars().take(2).collect();
    if prefix.len() == 2 && !VALID_MOBILE_PREFIXES.contains(&prefix.as_str()) {
        warn!(phone = %cleaned, %prefix, "phone number prefix is not a VN mobile prefix");
    }

    let length = cleaned.chars().count();
    if length > PHONE_LENGTH {
        cleaned = cleaned.chars().take(PHONE_LENGTH).collect();
        warn!(phone = %cleaned, "phone number truncated to 10 digits");
    } else if length < PHONE_LENGTH {
        warn!(phone = %cleaned, length, "phone number is shorter than the 10-digit standard");
    }

    cleaned
}

/// Check a phone number against the Vietnamese mobile standard without
/// mutating it. Returns a message describing the first problem found.
pub fn phone_issue(phone: &str) -> Option<String> {
    let mut cleaned = strip_separators(phone);

    if let Some(rest) = cleaned.strip_prefix("+84") {
        cleaned = format!("0{rest}");
    } else if cleaned.starts_with("84") && cleaned.chars().count() >= PHONE_LENGTH {
        let rest: String = cleaned.chars().skip(2).collect();
        cleaned = format!("0{rest}");
    }

    if cleaned.chars().count() != PHONE_LENGTH {
        return Some(format!("phone number '{phone}' is not 10 digits long"));
    }

    if !cleaned.starts_with('0') {
        return Some(format!("phone number '{phone}' does not start with 0"));
    }

    let prefix: String = cleaned.chars().take(2).collect();
    if !VALID_MOBILE_PREFIXES.contains(&prefix.as_str()) {
        return Some(format!(
            "phone number '{phone}' has prefix {prefix}, which is not a VN mobile prefix"
        ));
    }

    None
}

/// Normalize a national ID to the legacy 9-digit or new 12-digit standard.
///
/// Alphanumeric IDs (passports) pass through unchanged. Purely numeric IDs
/// shorter than the nearest standard length are left-zero-padded; lengths
/// of exactly 9 or 12 pass through; anything else passes through with a
/// warning. Deliberately permissive: this is a repair step, not validation.
pub fn normalize_national_id(raw: &str) -> String {
    let cleaned = strip_separators(raw);

    if cleaned.chars().any(|c| c.is_alphabetic()) {
        return cleaned;
    }

    if !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit()) {
        return match cleaned.len() {
            0..=8 => {
                let padded = format!("{cleaned:0>9}");
                debug!(id = %cleaned, %padded, "national ID padded to legacy 9-digit form");
                padded
            }
            9 | 12 => cleaned,
            10 | 11 => {
                let padded = format!("{cleaned:0>12}");
                debug!(id = %cleaned, %padded, "national ID padded to 12-digit form");
                padded
            }
            other => {
                warn!(id = %cleaned, length = other, "national ID length matches neither standard");
                cleaned
            }
        };
    }

    cleaned
}

/// Strip separators from identifier-like values (CIF, account numbers)
/// while preserving leading zeros.
pub fn clean_digits(raw: &str) -> String {
    strip_separators(raw)
}

/// Truncate to `max_len` characters (not bytes) when a limit is declared.
pub fn truncate_chars(text: String, max_len: Option<usize>) -> String {
    match max_len {
        Some(max) if text.chars().count() > max => text.chars().take(max).collect(),
        _ => text,
    }
}

fn strip_separators(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Render a numeric cell the way the row layer displayed it: integral
/// values without a trailing fraction.
fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Interpret a positive number as a spreadsheet serial date (day offset
/// from 1899-12-30) and format it canonically.
fn serial_to_date(serial: f64) -> Option<String> {
    if serial <= 0.0 || !serial.is_finite() {
        return None;
    }

    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::seconds((serial * 86_400.0) as i64);
    let moment: NaiveDateTime = epoch.checked_add_signed(offset)?;

    Some(moment.format(CANONICAL_DATE_FORMAT).to_string())
}
