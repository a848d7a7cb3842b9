//! Criteria and ordering types for persister lookups.
//!
//! Criteria are keyed by entity property name; the persister translates them
//! into index field names before building the engine query.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conjunctive equality criteria keyed by entity property name.
///
/// Entries keep their insertion order, so `first` is the first pair added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    entries: Vec<(String, Value)>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create criteria matching a single property.
    ///
    /// # Example
    ///
    /// ```
    /// use search_odm_shared::SearchCriteria;
    ///
    /// let criteria = SearchCriteria::by("name", "Widget").with("color", "red");
    /// assert_eq!(criteria.len(), 2);
    /// ```
    pub fn by(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(property, value)
    }

    /// Add a property/value pair, replacing an existing entry for the same property.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        let property = property.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == property) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((property, value)),
        }
        self
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value)
    }

    /// The first value added, regardless of its property.
    pub fn first(&self) -> Option<&Value> {
        self.entries.first().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SearchCriteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |criteria, (key, value)| criteria.with(key, value))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Ordered list of sort keys keyed by entity property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    entries: Vec<(String, SortOrder)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(property: impl Into<String>) -> Self {
        Self::new().then(property, SortOrder::Asc)
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self::new().then(property, SortOrder::Desc)
    }

    /// Append a secondary sort key.
    pub fn then(mut self, property: impl Into<String>, order: SortOrder) -> Self {
        self.entries.push((property.into(), order));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortOrder)> {
        self.entries.iter().map(|(key, order)| (key.as_str(), *order))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
