//! Search conditions for the Cyoda entity client.
//!
//! Defines the logical condition tree application code uses to describe
//! a query, independent of the platform's wire format:
//! - [`SearchCondition`]: one `field <operator> value` test
//! - [`SearchOperator`]: the comparison applied by a condition
//! - [`LogicalOperator`]: how a request combines its conditions (AND/OR)
//! - [`SearchConditionRequest`]: an immutable, ordered set of conditions
//!   with an optional result window (limit/offset)
//!
//! # Example
//!
//! ```
//! use cyoda_query::{LogicalOperator, SearchConditionRequest};
//!
//! let request = SearchConditionRequest::builder()
//!     .equals("status", "active")
//!     .contains("name", "smith")
//!     .operator(LogicalOperator::Or)
//!     .limit(10)
//!     .build();
//!
//! assert_eq!(request.conditions().len(), 2);
//! assert_eq!(request.limit(), Some(10));
//! ```

mod condition;
mod request;

pub use condition::{LogicalOperator, SearchCondition, SearchOperator, UnknownOperator};
pub use request::{SearchConditionRequest, SearchConditionRequestBuilder};
