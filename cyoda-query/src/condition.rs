use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Comparison applied by a single [`SearchCondition`].
///
/// The serialized form is the short operator code used in the neutral
/// condition mapping (`{"age": {"gt": 18}}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchOperator {
    #[serde(rename = "eq")]
    Equals,
    #[serde(rename = "ieq")]
    IEquals,
    #[serde(rename = "ne")]
    NotEquals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "icontains")]
    IContains,
    #[serde(rename = "gt")]
    GreaterThan,
    #[serde(rename = "lt")]
    LessThan,
    #[serde(rename = "gte")]
    GreaterThanOrEqual,
    #[serde(rename = "lte")]
    LessThanOrEqual,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
}

impl SearchOperator {
    /// All operators, in code-table order.
    pub const ALL: [SearchOperator; 13] = [
        Self::Equals,
        Self::IEquals,
        Self::NotEquals,
        Self::Contains,
        Self::IContains,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::StartsWith,
        Self::EndsWith,
        Self::In,
        Self::NotIn,
    ];

    /// Returns the short operator code (`"eq"`, `"gte"`, ...).
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::IEquals => "ieq",
            Self::NotEquals => "ne",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
            Self::GreaterThanOrEqual => "gte",
            Self::LessThanOrEqual => "lte",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::In => "in",
            Self::NotIn => "not_in",
        }
    }

    /// Returns true for [`SearchOperator::Equals`].
    #[must_use]
    pub fn is_equals(&self) -> bool {
        matches!(self, Self::Equals)
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Returned when parsing an operator code that is not in the code table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown search operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for SearchOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.code() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// How the conditions of a request are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    /// Key used for this operator in the neutral condition mapping.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// A single `field <operator> value` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCondition {
    pub field: String,
    pub operator: SearchOperator,
    pub value: serde_json::Value,
}

impl SearchCondition {
    pub fn new(
        field: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}
