//! Caller-built query resources: segments, property filters, and events.
//!
//! These types are constructed once by the caller and borrowed by the
//! client for the duration of a single call. Their `definition()` methods
//! produce the JSON fragments the Dashboard API expects in the `s`, `e`,
//! `se`, and `re` query parameters.

use serde::{Deserialize, Serialize};

/// Comparison operator of a property filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "is not")]
    IsNot,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "does not contain")]
    DoesNotContain,
    #[serde(rename = "less")]
    Less,
    #[serde(rename = "less or equal")]
    LessOrEqual,
    #[serde(rename = "greater")]
    Greater,
    #[serde(rename = "greater or equal")]
    GreaterOrEqual,
    #[serde(rename = "set is")]
    SetIs,
    #[serde(rename = "set is not")]
    SetIsNot,
}

impl std::fmt::Display for FilterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::Contains => "contains",
            Self::DoesNotContain => "does not contain",
            Self::Less => "less",
            Self::LessOrEqual => "less or equal",
            Self::Greater => "greater",
            Self::GreaterOrEqual => "greater or equal",
            Self::SetIs => "set is",
            Self::SetIsNot => "set is not",
        };
        write!(f, "{op}")
    }
}

/// A single property filter clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentFilter {
    /// Property name the clause compares against.
    pub prop: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Values to compare with; multiple values act as alternatives.
    pub values: Vec<String>,
}

/// How the filter clauses of a segment are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

/// A named user subset described by a boolean combination of property
/// filters.
///
/// Immutable once built; endpoint methods borrow segments and never take
/// ownership.
///
/// ```rust
/// use amplitude_dashboard::{FilterOp, Segment};
///
/// let paying_us = Segment::new("paying-us")
///     .filter("country", FilterOp::Is, ["United States"])
///     .filter("paying", FilterOp::Is, ["true"]);
/// assert_eq!(paying_us.filter_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    conjunction: Conjunction,
    filters: Vec<SegmentFilter>,
}

impl Segment {
    /// Create an empty segment with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conjunction: Conjunction::And,
            filters: Vec::new(),
        }
    }

    /// Set how the filter clauses combine (default: [`Conjunction::And`]).
    #[must_use]
    pub fn combine(mut self, conjunction: Conjunction) -> Self {
        self.conjunction = conjunction;
        self
    }

    /// Add a filter clause.
    #[must_use]
    pub fn filter<V, S>(mut self, prop: impl Into<String>, op: FilterOp, values: V) -> Self
    where
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(SegmentFilter {
            prop: prop.into(),
            op,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Segment name, used for logging only; never sent to the API.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the filter clauses combine.
    #[must_use]
    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    /// The filter clauses.
    #[must_use]
    pub fn filters(&self) -> &[SegmentFilter] {
        &self.filters
    }

    /// Number of filter clauses. Each clause counts as one condition in the
    /// query-cost estimate.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// The remote segment-definition syntax: a JSON array of this segment's
    /// filter clauses.
    #[must_use]
    pub fn definition(&self) -> String {
        // Strings and enums cannot fail to serialize.
        serde_json::to_string(&self.filters).unwrap_or_else(|_| String::from("[]"))
    }
}

/// A named analytics event, optionally restricted by property filters and
/// bucketed by group-by properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    filters: Vec<SegmentFilter>,
    group_by: Vec<String>,
}

#[derive(Serialize)]
struct EventDef<'a> {
    event_type: &'a str,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    filters: &'a [SegmentFilter],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    group_by: &'a [String],
}

impl Event {
    /// Create an event definition for the given event type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            group_by: Vec::new(),
        }
    }

    /// Restrict the event with a property filter clause.
    #[must_use]
    pub fn filter<V, S>(mut self, prop: impl Into<String>, op: FilterOp, values: V) -> Self
    where
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(SegmentFilter {
            prop: prop.into(),
            op,
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Bucket the event counts by a property.
    #[must_use]
    pub fn group_by(mut self, prop: impl Into<String>) -> Self {
        self.group_by.push(prop.into());
        self
    }

    /// The event type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property filter clauses.
    #[must_use]
    pub fn filters(&self) -> &[SegmentFilter] {
        &self.filters
    }

    /// The group-by properties.
    #[must_use]
    pub fn group_by_props(&self) -> &[String] {
        &self.group_by
    }

    /// The remote event syntax: a JSON object with the event type plus
    /// `filters` and `group_by` keys only when non-empty.
    #[must_use]
    pub fn definition(&self) -> String {
        let def = EventDef {
            event_type: &self.name,
            filters: &self.filters,
            group_by: &self.group_by,
        };
        serde_json::to_string(&def).unwrap_or_else(|_| String::from("{}"))
    }
}
