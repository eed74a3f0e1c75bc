//! Cache key fingerprints.

use std::fmt;

use sha2::Digest;
use sha2::Sha256;

use super::FilterValue;
use super::QueryConfig;

/// Deterministic cache key for one page of a query.
///
/// Covers the collection, columns, applied filters, order, page, and page
/// size. The key starts with `"<collection>:"` so every page of a
/// collection can be dropped with
/// [`QueryCache::invalidate_prefix`](crate::cache::QueryCache::invalidate_prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `page` of `config`.
    pub fn for_page(config: &QueryConfig, page: usize) -> Self {
        let mut hasher = Sha256::new();

        for column in config.columns() {
            field(&mut hasher, "col", column);
        }
        for (name, value) in config.filters() {
            if value.is_absent() {
                continue;
            }
            match value {
                FilterValue::Exact(v) => {
                    field(&mut hasher, "eq", name);
                    field(&mut hasher, v.type_name(), &v.to_string());
                }
                FilterValue::Pattern(p) => {
                    field(&mut hasher, "ilike", name);
                    field(&mut hasher, "pattern", p);
                }
            }
        }
        if let Some(order) = config.order_by() {
            for (name, direction) in order.fields() {
                field(&mut hasher, direction.as_str(), name);
            }
        }

        CacheKey(format!(
            "{}:{}x{}:{:x}",
            config.collection(),
            page,
            config.page_size(),
            hasher.finalize()
        ))
    }

    /// Prefix shared by every key of `collection`.
    pub fn collection_prefix(collection: &str) -> String {
        format!("{collection}:")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn field(hasher: &mut Sha256, tag: &str, text: &str) {
    // Length prefixes keep ("ab", "c") distinct from ("a", "bc").
    for part in [tag, text] {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
