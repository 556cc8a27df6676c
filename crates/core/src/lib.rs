//! # SimoBridge Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The conversion/validation engine (field normalization + data-driven
//!   schema mapping)
//! - Port/adapter interfaces (traits) for token and configuration storage
//!
//! ## Architecture Principles
//! - Only depends on `simobridge-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod convert;
pub mod submission;

// Re-export specific items to avoid ambiguity
pub use convert::mapper::{convert, convert_row, validate_phone_batch, BatchValidation};
pub use convert::normalize::SkipReason;
pub use convert::schema::{field_table, FieldKind, FieldNorm, FieldSpec, PHONE_FIELD};
pub use submission::ports::{ApiConfigStore, TokenStore};
