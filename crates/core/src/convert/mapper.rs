//! Generic row-to-record conversion
//!
//! A single mapper consumes the per-type field tables from
//! [`super::schema`]; there is no per-record-type conversion code.
//! Conversion never fails: malformed values are skipped (with the reason
//! logged) and rows that produce no fields are dropped from the output.

use serde_json::Value;
use simobridge_domain::{RecordType, SourceRow, SourceValue, TargetRecord};
use tracing::debug;

use super::normalize;
use super::schema::{field_table, FieldKind, FieldNorm, FieldSpec, PHONE_FIELD};

/// Convert a batch of source rows into payload records for `record_type`.
///
/// Returns whatever records could be built — possibly fewer than the input
/// rows, possibly none.
pub fn convert(rows: &[SourceRow], record_type: RecordType) -> Vec<TargetRecord> {
    let records: Vec<TargetRecord> =
        rows.iter().filter_map(|row| convert_row(row, record_type)).collect();

    debug!(
        record_type = %record_type,
        input_rows = rows.len(),
        output_records = records.len(),
        "converted batch"
    );

    records
}

/// Convert a single row; `None` when no declared field survived coercion.
pub fn convert_row(row: &SourceRow, record_type: RecordType) -> Option<TargetRecord> {
    let mut record = TargetRecord::new();

    for spec in field_table(record_type) {
        let Some(raw) = spec.source_keys.iter().find_map(|key| row.get(*key)) else {
            continue;
        };

        match spec.kind {
            FieldKind::Int => match normalize::coerce_integer(raw) {
                Ok(value) => {
                    record.insert(spec.name.to_string(), Value::from(value));
                }
                Err(reason) => {
                    if let Some(default) = spec.empty_default {
                        record.insert(spec.name.to_string(), Value::from(default));
                    } else {
                        debug!(field = spec.name, reason = reason.as_str(), "field skipped");
                    }
                }
            },
            FieldKind::Date => match normalize::coerce_date(raw) {
                Ok(value) => {
                    record.insert(spec.name.to_string(), Value::from(value));
                }
                Err(reason) => {
                    debug!(field = spec.name, reason = reason.as_str(), "field skipped");
                }
            },
            FieldKind::Str { max_len } => match normalize::coerce_string(raw, None) {
                Ok(value) => {
                    let normalized = apply_norm(spec, value);
                    let bounded = normalize::truncate_chars(normalized, max_len);
                    if bounded.is_empty() {
                        debug!(field = spec.name, "field empty after normalization, skipped");
                    } else {
                        record.insert(spec.name.to_string(), Value::from(bounded));
                    }
                }
                Err(reason) => {
                    debug!(field = spec.name, reason = reason.as_str(), "field skipped");
                }
            },
        }
    }

    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}

fn apply_norm(spec: &FieldSpec, value: String) -> String {
    match spec.norm {
        FieldNorm::None => value,
        FieldNorm::Phone => normalize::normalize_phone(&value),
        FieldNorm::NationalId => normalize::normalize_national_id(&value),
        FieldNorm::Digits => normalize::clean_digits(&value),
    }
}

/// Result of the pre-export phone gate.
///
/// The gate is warn-only: callers surface the messages to the operator but
/// may proceed with the submission anyway.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchValidation {
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

/// Run the VN phone check (without mutating data) over every record that
/// carries the phone field; one message per offending record.
pub fn validate_phone_batch(records: &[TargetRecord]) -> BatchValidation {
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if let Some(Value::String(phone)) = record.get(PHONE_FIELD) {
            if let Some(issue) = normalize::phone_issue(phone) {
                warnings.push(format!("record #{}: {}", index + 1, issue));
            }
        }
    }

    BatchValidation { is_valid: warnings.is_empty(), warnings }
}
