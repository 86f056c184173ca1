use crate::condition::{LogicalOperator, SearchCondition, SearchOperator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered set of conditions plus an optional result window.
///
/// Immutable once built; construct one with [`SearchConditionRequest::builder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConditionRequest {
    conditions: Vec<SearchCondition>,
    operator: LogicalOperator,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl SearchConditionRequest {
    /// Starts a new builder with no conditions and the AND operator.
    #[must_use]
    pub fn builder() -> SearchConditionRequestBuilder {
        SearchConditionRequestBuilder::default()
    }

    #[must_use]
    pub fn conditions(&self) -> &[SearchCondition] {
        &self.conditions
    }

    #[must_use]
    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Applies the offset, then the limit, to an already fetched result list.
    pub fn apply_window<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.unwrap_or(0);
        let iter = items.into_iter().skip(offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Fluent builder for [`SearchConditionRequest`].
#[derive(Debug, Clone, Default)]
pub struct SearchConditionRequestBuilder {
    request: SearchConditionRequest,
}

impl SearchConditionRequestBuilder {
    /// Adds `field == value`.
    #[must_use]
    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_condition(field, SearchOperator::Equals, value)
    }

    /// Adds a substring match on `field`.
    #[must_use]
    pub fn contains(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_condition(field, SearchOperator::Contains, value)
    }

    /// Adds a membership test: `field` must equal one of `values`.
    #[must_use]
    pub fn in_values<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.add_condition(field, SearchOperator::In, Value::Array(values))
    }

    /// Adds an arbitrary condition. Conditions keep insertion order.
    #[must_use]
    pub fn add_condition(
        mut self,
        field: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<Value>,
    ) -> Self {
        self.request
            .conditions
            .push(SearchCondition::new(field, operator, value));
        self
    }

    #[must_use]
    pub fn operator(mut self, operator: LogicalOperator) -> Self {
        self.request.operator = operator;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.request.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.request.offset = Some(offset);
        self
    }

    /// Returns a snapshot of the conditions added so far.
    ///
    /// The builder stays usable; later additions do not affect requests
    /// already built.
    #[must_use]
    pub fn build(&self) -> SearchConditionRequest {
        self.request.clone()
    }
}
