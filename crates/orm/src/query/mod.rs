//! Query Builder Module - fluent, deferred queries over one model's table

pub mod builder;
pub mod condition;
pub mod execution;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::Query;
pub use condition::{Condition, Predicate};
pub use ordering::{OrderTerm, Ordering};
pub use select::Distinct;
pub use types::{OrderDirection, Operator};
