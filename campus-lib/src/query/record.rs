//! Dynamic rows

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// A row returned by a data source: column name to [`Value`].
///
/// Serializes as a plain JSON object, so rows round-trip with the backend's
/// representation.
///
/// # Example
///
/// ```
/// use campus_lib::query::Record;
///
/// let student = Record::new()
///     .set("name", "Ada Lovelace")
///     .set("grade", 7);
///
/// assert_eq!(student.get_str("name").unwrap(), Some("Ada Lovelace"));
/// assert_eq!(student.get_i64("grade").unwrap(), Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value (builder style).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Sets a column value in place.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns the raw value of a column.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a string column; `Ok(None)` when the column is null.
    pub fn get_str(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(FieldError::wrong_type(field, "string", other.type_name())),
        }
    }

    /// Returns an integer column; `Ok(None)` when the column is null.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::wrong_type(field, "int", other.type_name())),
        }
    }

    /// Returns a boolean column; `Ok(None)` when the column is null.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::wrong_type(field, "bool", other.type_name())),
        }
    }

    /// Returns a copy holding only `columns` (all columns when `columns` is empty).
    ///
    /// Columns the row does not have are left out rather than set to null.
    pub fn project(&self, columns: &[String]) -> Record {
        if columns.is_empty() {
            return self.clone();
        }
        let fields = columns
            .iter()
            .filter_map(|c| self.fields.get(c).map(|v| (c.clone(), v.clone())))
            .collect();
        Record { fields }
    }

    /// Iterates over columns in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let row = Record::new()
            .set("name", "Grace")
            .set("homeroom", Value::Null)
            .set("grade", 9);

        assert_eq!(row.get_str("name"), Ok(Some("Grace")));
        assert_eq!(row.get_str("homeroom"), Ok(None));
        assert_eq!(row.get_str("email"), Err(FieldError::missing("email")));
        assert_eq!(
            row.get_str("grade"),
            Err(FieldError::wrong_type("grade", "string", "int"))
        );
    }

    #[test]
    fn test_project_keeps_requested_columns() {
        let row = Record::new().set("id", 1).set("name", "Grace").set("dob", "1906-12-09");
        let projected = row.project(&["name".to_string(), "id".to_string(), "nope".to_string()]);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected.get("id"), Some(&Value::Int(1)));
        assert!(projected.get("dob").is_none());
        assert_eq!(row.project(&[]), row);
    }

    #[test]
    fn test_deserialize_row_object() {
        let row: Record = serde_json::from_str(r#"{"id": 4, "name": "Alan", "active": true}"#).unwrap();
        assert_eq!(row.get_bool("active"), Ok(Some(true)));
        assert_eq!(row.get_i64("id"), Ok(Some(4)));
    }
}
