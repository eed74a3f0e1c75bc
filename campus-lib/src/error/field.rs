//! Row field access errors

/// Error returned by the typed getters on [`Record`](crate::query::Record).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The row has no such column (it was not selected, or does not exist).
    #[error("column '{field}' is not present in the row")]
    Missing { field: String },

    /// The column holds a value of another type.
    #[error("column '{field}' holds {found}, not {wanted}")]
    WrongType {
        field: String,
        wanted: &'static str,
        found: &'static str,
    },
}

impl FieldError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Missing {
            field: field.to_string(),
        }
    }

    pub(crate) fn wrong_type(field: &str, wanted: &'static str, found: &'static str) -> Self {
        Self::WrongType {
            field: field.to_string(),
            wanted,
            found,
        }
    }

    /// Returns the column the error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field } | Self::WrongType { field, .. } => field,
        }
    }
}
