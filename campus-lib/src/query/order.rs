//! Result ordering.

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Maps an ascending flag to a direction.
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { Direction::Asc } else { Direction::Desc }
    }

    pub fn is_ascending(self) -> bool {
        self == Direction::Asc
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Ordering of query results: one or more columns, each with a direction.
///
/// Later columns break ties left by earlier ones.
///
/// # Example
///
/// ```
/// use campus_lib::query::OrderBy;
///
/// let order = OrderBy::desc("enrolled_at").then_asc("last_name");
/// assert_eq!(order.fields().len(), 2);
/// assert_eq!(order.to_string(), "enrolled_at.desc,last_name.asc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    fields: Vec<(String, Direction)>,
}

impl OrderBy {
    /// Orders by a single column.
    pub fn new(field: impl Into<String>, ascending: bool) -> Self {
        Self {
            fields: vec![(field.into(), Direction::from_ascending(ascending))],
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, true)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, false)
    }

    pub fn then_asc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Direction::Asc));
        self
    }

    pub fn then_desc(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), Direction::Desc));
        self
    }

    /// Returns the ordered columns with their directions.
    pub fn fields(&self) -> &[(String, Direction)] {
        &self.fields
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (field, direction)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}.{}", field, direction.as_str())?;
        }
        Ok(())
    }
}
