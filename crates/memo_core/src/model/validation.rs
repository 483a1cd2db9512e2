//! Field-level validation errors shared by all domain records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason a record was refused before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    MissingField(&'static str),
    /// Quotation line quantity below one.
    InvalidQuantity(i64),
    /// Interval end is not strictly after its start.
    InvalidInterval { start: i64, end: i64 },
    /// Field carries a value outside its allowed set.
    InvalidValue { field: &'static str, value: String },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is empty"),
            Self::InvalidQuantity(value) => {
                write!(f, "quantity must be at least 1, got {value}")
            }
            Self::InvalidInterval { start, end } => write!(
                f,
                "interval end ({end}) must be after its start ({start})"
            ),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid value `{value}` for field `{field}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Fails with `MissingField` when `value` is blank.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Trims a value and maps blank input to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
