use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Column name -> new value, in the order the caller supplied them.
pub type FieldMap = serde_json::Map<String, Value>;

/// Ordered list of bound values for a parameterized statement.
///
/// The placeholder for a value is its 1-based position in the list, so values
/// are only ever appended. Nothing is removed or renumbered once a placeholder
/// has been written into statement text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamList {
    values: Vec<Value>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its placeholder index (1-based).
    pub fn push(&mut self, value: impl Into<Value>) -> usize {
        self.values.push(value.into());
        self.values.len()
    }

    /// Append a value and return the rendered `$n` marker for it.
    pub fn placeholder(&mut self, value: impl Into<Value>) -> String {
        format!("${}", self.push(value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn last(&self) -> Option<&Value> {
        self.values.last()
    }
}

impl<'a> IntoIterator for &'a ParamList {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Statement text plus the params its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: ParamList,
}

/// Inclusive numeric bounds on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCriterion {
    /// Logical name used in error messages, e.g. "employees"
    pub name: String,
    pub column: String,
    pub min: Option<Number>,
    pub max: Option<Number>,
}

impl RangeCriterion {
    pub fn is_inverted(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => match (min.as_f64(), max.as_f64()) {
                (Some(lo), Some(hi)) => lo > hi,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Case-insensitive containment on one text column.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriterion {
    pub name: String,
    pub column: String,
    pub term: String,
}

/// Optional listing criteria. Ranges are applied before searches, each group
/// in the order it was declared, so placeholder numbering is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub ranges: Vec<RangeCriterion>,
    pub searches: Vec<SearchCriterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a range criterion. Absent bounds emit nothing.
    pub fn range(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        min: Option<Number>,
        max: Option<Number>,
    ) -> Self {
        self.ranges.push(RangeCriterion {
            name: name.into(),
            column: column.into(),
            min,
            max,
        });
        self
    }

    /// Declare a substring criterion. `None` and empty terms are skipped.
    pub fn search(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        term: Option<String>,
    ) -> Self {
        if let Some(term) = term.filter(|t| !t.is_empty()) {
            self.searches.push(SearchCriterion {
                name: name.into(),
                column: column.into(),
                term,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
            && self
                .ranges
                .iter()
                .all(|r| r.min.is_none() && r.max.is_none())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Ascending is the SQL default and renders as nothing.
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "",
            SortDirection::Desc => " DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}
