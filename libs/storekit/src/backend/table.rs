//! Relational table store with server-side filtering, ordering and ranges.

use async_trait::async_trait;

use crate::error::BackendError;

/// A stored row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    /// Case-insensitive pattern where `%` matches any run and `_` one character.
    ILike,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: PredicateOp,
    pub value: serde_json::Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: PredicateOp, value: serde_json::Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn equals(column: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(column, PredicateOp::Eq, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// Native query: every `filters` entry must hold, and at least one
/// `any_of` entry must hold when the group is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct TableQuery {
    pub filters: Vec<Predicate>,
    pub any_of: Vec<Predicate>,
    pub order: Vec<OrderBy>,
    /// Inclusive row window.
    pub range: Option<(u64, u64)>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn or(mut self, predicates: Vec<Predicate>) -> Self {
        self.any_of.extend(predicates);
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order.push(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some((from, to));
        self
    }
}

#[async_trait]
pub trait TableClient: Send + Sync {
    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, BackendError>;

    /// Exact number of rows matching the query, ignoring order and range.
    async fn count(&self, table: &str, query: &TableQuery) -> Result<u64, BackendError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row, BackendError>;

    /// Apply `patch` to every matching row and return the updated rows.
    async fn update(
        &self,
        table: &str,
        filters: &[Predicate],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError>;

    /// Delete every matching row and return how many were removed.
    async fn delete(&self, table: &str, filters: &[Predicate]) -> Result<u64, BackendError>;
}
