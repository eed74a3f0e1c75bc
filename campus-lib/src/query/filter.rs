//! Filter values and applied filter conditions.

use super::Value;
use crate::error::ConfigError;

/// Tag prefix selecting a case-insensitive pattern match.
const PATTERN_TAG: &str = "ilike";
/// Tag prefix selecting an exact match on the remaining text.
const EXACT_TAG: &str = "eq";

/// The value side of a configured filter.
///
/// # Example
///
/// ```
/// use campus_lib::query::{FilterValue, Value};
///
/// assert_eq!(
///     FilterValue::parse_tagged("name", "ilike:ada").unwrap(),
///     FilterValue::Pattern("ada".to_string())
/// );
/// assert_eq!(
///     FilterValue::parse_tagged("status", "active").unwrap(),
///     FilterValue::Exact(Value::from("active"))
/// );
/// assert!(FilterValue::parse_tagged("status", "gte:5").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// The column must equal the value.
    Exact(Value),
    /// The column must match the pattern, ignoring case.
    ///
    /// The pattern matches anywhere in the column. Inside it, `%` matches any
    /// run of characters and `_` a single character.
    Pattern(String),
}

impl FilterValue {
    /// Parses the tagged string form used by search boxes and query strings.
    ///
    /// `"ilike:<pattern>"` is a pattern match, `"eq:<text>"` an exact match on
    /// the text. An unknown lowercase tag directly followed by its operand
    /// (`"gte:5"`) is rejected. Anything else, including `"note: late bus"`
    /// and URLs, is an exact match on the whole string; prefix such values
    /// with `eq:` to be explicit.
    pub fn parse_tagged(field: &str, raw: &str) -> Result<Self, ConfigError> {
        let Some((tag, rest)) = raw.split_once(':') else {
            return Ok(FilterValue::Exact(Value::from(raw)));
        };

        match tag {
            PATTERN_TAG => Ok(FilterValue::Pattern(rest.to_string())),
            EXACT_TAG => Ok(FilterValue::Exact(Value::from(rest))),
            _ if is_tag_shaped(tag, rest) => Err(ConfigError::malformed_filter(field, tag)),
            _ => Ok(FilterValue::Exact(Value::from(raw))),
        }
    }

    /// Returns `true` when the filter must not be applied: a null or empty
    /// exact value, or an empty pattern.
    pub fn is_absent(&self) -> bool {
        match self {
            FilterValue::Exact(value) => value.is_blank(),
            FilterValue::Pattern(pattern) => pattern.is_empty(),
        }
    }
}

fn is_tag_shaped(tag: &str, rest: &str) -> bool {
    !tag.is_empty()
        && tag.bytes().all(|b| b.is_ascii_lowercase())
        && !rest.starts_with(|c: char| c.is_whitespace() || c == '/')
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Exact(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Exact(Value::from(value))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Exact(Value::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Exact(Value::from(value))
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Exact(Value::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Exact(Value::from(value))
    }
}

/// A filter condition sent to a data source.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Equality: `field = value`
    Eq(String, Value),
    /// Case-insensitive pattern: `field ILIKE pattern`
    ILike(String, String),
}

impl Filter {
    /// Creates an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Creates a case-insensitive pattern filter.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Filter::ILike(field.into(), pattern.into())
    }

    /// Builds the condition for a configured filter, or `None` if it is absent.
    pub fn from_config(field: &str, value: &FilterValue) -> Option<Self> {
        if value.is_absent() {
            return None;
        }
        Some(match value {
            FilterValue::Exact(v) => Filter::Eq(field.to_string(), v.clone()),
            FilterValue::Pattern(p) => Filter::ILike(field.to_string(), p.clone()),
        })
    }

    /// Returns the filtered column.
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::ILike(field, _) => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged() {
        assert_eq!(
            FilterValue::parse_tagged("class", "eq:7B").unwrap(),
            FilterValue::Exact(Value::from("7B"))
        );
        assert_eq!(
            FilterValue::parse_tagged("starts", "08:30").unwrap(),
            FilterValue::Exact(Value::from("08:30"))
        );
        assert_eq!(
            FilterValue::parse_tagged("note", "Re: homework").unwrap(),
            FilterValue::Exact(Value::from("Re: homework"))
        );
        assert_eq!(
            FilterValue::parse_tagged("name", "like:x"),
            Err(ConfigError::malformed_filter("name", "like"))
        );
        assert_eq!(
            FilterValue::parse_tagged("name", "gte:"),
            Err(ConfigError::malformed_filter("name", "gte"))
        );
    }

    #[test]
    fn test_parse_tagged_keeps_plain_text_with_colons() {
        assert_eq!(
            FilterValue::parse_tagged("note", "note: late bus").unwrap(),
            FilterValue::Exact(Value::from("note: late bus"))
        );
        assert_eq!(
            FilterValue::parse_tagged("homepage", "https://school.example.com").unwrap(),
            FilterValue::Exact(Value::from("https://school.example.com"))
        );
        assert_eq!(
            FilterValue::parse_tagged("note", "eq:todo:call home").unwrap(),
            FilterValue::Exact(Value::from("todo:call home"))
        );
    }

    #[test]
    fn test_absent_values_produce_no_condition() {
        for value in [
            FilterValue::Exact(Value::Null),
            FilterValue::Exact(Value::from("")),
            FilterValue::Pattern(String::new()),
        ] {
            assert!(Filter::from_config("name", &value).is_none());
        }

        assert_eq!(
            Filter::from_config("grade", &FilterValue::from(0)),
            Some(Filter::eq("grade", 0))
        );
        assert_eq!(
            Filter::from_config("name", &FilterValue::Pattern("ada".into())),
            Some(Filter::ilike("name", "ada"))
        );
    }
}
