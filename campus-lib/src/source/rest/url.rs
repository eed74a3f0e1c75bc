//! PostgREST URL and header generation.

use url::Url;

use crate::error::ApiError;
use crate::query::Filter;
use crate::query::OrderBy;
use crate::query::QueryRequest;
use crate::query::Value;

/// Builds the request URL for a ranged read of `request.collection`.
///
/// ```text
/// {base}/rest/v1/students?select=id,name&grade=eq.7&name=ilike.*ada*&order=name.asc
/// ```
pub fn build_url(base_url: &str, request: &QueryRequest) -> Result<Url, ApiError> {
    let raw = format!(
        "{}/rest/v1/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&request.collection)
    );
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("select", &select_param(&request.columns));
        for filter in &request.filters {
            let (field, condition) = filter_to_param(filter);
            query.append_pair(&field, &condition);
        }
        if let Some(order) = &request.order_by {
            query.append_pair("order", &order_to_param(order));
        }
    }

    Ok(url)
}

/// Renders the `select` parameter: `*` or a comma-separated column list.
pub fn select_param(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    }
}

/// Renders a filter as a `(column, operator.operand)` query pair.
pub fn filter_to_param(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq(field, Value::Null) => (field.clone(), "is.null".to_string()),
        Filter::Eq(field, value) => (field.clone(), format!("eq.{}", value_to_param(value))),
        Filter::ILike(field, pattern) => (field.clone(), format!("ilike.{}", pattern_to_param(pattern))),
    }
}

/// Renders a value as a PostgREST operand.
pub fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quoting(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

/// Converts a search pattern to a PostgREST `ilike` operand matching anywhere
/// in the column. `*` stands for `%`.
pub fn pattern_to_param(pattern: &str) -> String {
    format!("*{}*", pattern.replace('%', "*"))
}

/// Renders the `order` parameter, e.g. `last_name.asc,grade.desc.nullslast`.
pub fn order_to_param(order: &OrderBy) -> String {
    order
        .fields()
        .iter()
        .map(|(field, direction)| format!("{}.{}.nullslast", field, direction.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders the inclusive `Range` header value.
pub fn range_header(request: &QueryRequest) -> String {
    format!("{}-{}", request.from, request.to)
}

/// Extracts the total from a `Content-Range` header such as `0-19/95` or `*/0`.
///
/// Returns `None` when the total is unknown (`0-19/*`) or the header is malformed.
pub fn parse_content_range(header: &str) -> Option<usize> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

fn needs_quoting(s: &str) -> bool {
    s.contains([',', '(', ')', '"', '\\']) || s.trim() != s
}
