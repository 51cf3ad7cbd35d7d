//! Filtering, sorting and grouping over tables.

pub mod predicate;
pub mod reduce;
pub mod sort;

pub use predicate::{column, ColumnRef, Comparison, Predicate, SelectionMask};
pub use reduce::{reduce, reduce_many, Aggregation};
pub use sort::{sort_permutation, SortColumn, SortDirection, SortKey};
