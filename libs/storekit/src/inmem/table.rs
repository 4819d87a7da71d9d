//! In-process table store with unique constraints.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::backend::table::{OrderBy, Predicate, PredicateOp, Row, TableClient, TableQuery};
use crate::error::BackendError;
use crate::value::FilterValue;

#[derive(Debug, Clone)]
struct UniqueKey {
    name: String,
    columns: Vec<String>,
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    unique: Vec<UniqueKey>,
}

/// Table store kept in memory. Rows keep insertion order, which is also the
/// order among equal sort keys.
#[derive(Debug)]
pub struct MemoryTableClient {
    tables: RwLock<HashMap<String, Table>>,
    available: AtomicBool,
    calls: AtomicU64,
}

impl Default for MemoryTableClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTableClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            calls: AtomicU64::new(0),
        }
    }

    /// Declare a unique constraint over `columns`. Rows where any of the
    /// columns is null do not participate.
    #[must_use]
    pub fn with_unique(self, table: &str, columns: &[&str]) -> Self {
        {
            let mut tables = self.tables.write();
            let entry = tables.entry(table.to_owned()).or_default();
            entry.unique.push(UniqueKey {
                name: format!("{table}_{}_key", columns.join("_")),
                columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            });
        }
        self
    }

    /// Simulate an outage: every call fails with `Unavailable` while unset.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of client calls served so far, including failed ones.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    fn enter(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("table store is offline".to_owned()))
        }
    }

    fn matching(table: Option<&Table>, query: &TableQuery) -> Result<Vec<Row>, BackendError> {
        let Some(table) = table else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for row in &table.rows {
            if row_matches(row, &query.filters, &query.any_of)? {
                out.push(row.clone());
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl TableClient for MemoryTableClient {
    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, BackendError> {
        self.enter()?;
        let tables = self.tables.read();
        let mut rows = Self::matching(tables.get(table), query)?;
        if !query.order.is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, &query.order));
        }
        if let Some((from, to)) = query.range {
            let skip = usize::try_from(from).unwrap_or(usize::MAX);
            let take = usize::try_from(to.saturating_sub(from).saturating_add(1))
                .unwrap_or(usize::MAX);
            rows = rows.into_iter().skip(skip).take(take).collect();
        }
        Ok(rows)
    }

    async fn count(&self, table: &str, query: &TableQuery) -> Result<u64, BackendError> {
        self.enter()?;
        let tables = self.tables.read();
        let rows = Self::matching(tables.get(table), query)?;
        Ok(rows.len() as u64)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, BackendError> {
        self.enter()?;
        row.entry("id")
            .or_insert_with(|| serde_json::Value::String(Uuid::new_v4().to_string()));
        let mut tables = self.tables.write();
        let entry = tables.entry(table.to_owned()).or_default();
        check_unique(&entry.unique, &entry.rows, &row, None)?;
        entry.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Predicate],
        patch: Row,
    ) -> Result<Vec<Row>, BackendError> {
        self.enter()?;
        let mut tables = self.tables.write();
        let Some(entry) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut staged = entry.rows.clone();
        let mut touched = Vec::new();
        for (index, row) in staged.iter_mut().enumerate() {
            if row_matches(row, filters, &[])? {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                touched.push(index);
            }
        }
        for &index in &touched {
            check_unique(&entry.unique, &staged, &staged[index], Some(index))?;
        }
        let updated = touched.iter().map(|&i| staged[i].clone()).collect();
        entry.rows = staged;
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Predicate]) -> Result<u64, BackendError> {
        self.enter()?;
        let mut tables = self.tables.write();
        let Some(entry) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = entry.rows.len();
        let mut failure = None;
        entry.rows.retain(|row| match row_matches(row, filters, &[]) {
            Ok(matched) => !matched,
            Err(e) => {
                failure.get_or_insert(e);
                true
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
        Ok((before - entry.rows.len()) as u64)
    }
}

fn check_unique(
    keys: &[UniqueKey],
    rows: &[Row],
    candidate: &Row,
    skip: Option<usize>,
) -> Result<(), BackendError> {
    for key in keys {
        let values: Vec<FilterValue> = key
            .columns
            .iter()
            .map(|c| cell(candidate, c))
            .collect();
        if values.iter().any(FilterValue::is_null) {
            continue;
        }
        let clash = rows.iter().enumerate().any(|(index, row)| {
            Some(index) != skip
                && key
                    .columns
                    .iter()
                    .zip(&values)
                    .all(|(c, v)| cell(row, c).equals(v))
        });
        if clash {
            return Err(BackendError::UniqueViolation {
                constraint: key.name.clone(),
            });
        }
    }
    Ok(())
}

fn cell(row: &Row, column: &str) -> FilterValue {
    row.get(column)
        .map_or(FilterValue::Null, FilterValue::from_stored)
}

fn row_matches(row: &Row, all: &[Predicate], any: &[Predicate]) -> Result<bool, BackendError> {
    for p in all {
        if !predicate_matches(row, p)? {
            return Ok(false);
        }
    }
    if any.is_empty() {
        return Ok(true);
    }
    for p in any {
        if predicate_matches(row, p)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn predicate_matches(row: &Row, p: &Predicate) -> Result<bool, BackendError> {
    let left = cell(row, &p.column);
    let right = FilterValue::from_stored(&p.value);
    if left.is_null() && !right.is_null() {
        return Ok(false);
    }
    let ord = left.compare(&right);
    Ok(match p.op {
        PredicateOp::Eq => ord == Some(Ordering::Equal),
        PredicateOp::Neq => ord != Some(Ordering::Equal),
        PredicateOp::Gt => ord == Some(Ordering::Greater),
        PredicateOp::Gte => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
        PredicateOp::Lt => ord == Some(Ordering::Less),
        PredicateOp::Lte => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
        PredicateOp::In | PredicateOp::NotIn => {
            let Some(list) = right.as_list() else {
                return Err(BackendError::Rejected(format!(
                    "'{}' set filter needs a list",
                    p.column
                )));
            };
            let found = list.iter().any(|v| left.equals(v));
            found == (p.op == PredicateOp::In)
        }
        PredicateOp::ILike => {
            let Some(pattern) = right.as_text() else {
                return Err(BackendError::Rejected(format!(
                    "'{}' pattern filter needs text",
                    p.column
                )));
            };
            match row.get(&p.column) {
                Some(serde_json::Value::String(text)) => ilike(text, &pattern),
                _ => false,
            }
        }
    })
}

/// Nulls sort last ascending and first descending.
fn compare_rows(a: &Row, b: &Row, order: &[OrderBy]) -> Ordering {
    for key in order {
        let (x, y) = (cell(a, &key.column), cell(b, &key.column));
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => x.compare(&y).unwrap_or(Ordering::Equal),
        };
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Lit(char),
}

/// Case-insensitive `LIKE` with `%`, `_` and backslash escapes.
fn ilike(text: &str, pattern: &str) -> bool {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => tokens.push(Token::Any),
            '_' => tokens.push(Token::One),
            '\\' => tokens.push(Token::Lit(chars.next().unwrap_or('\\'))),
            c => tokens.push(Token::Lit(c)),
        }
    }
    let text: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    let tokens: Vec<Token> = tokens
        .into_iter()
        .flat_map(|t| match t {
            Token::Lit(c) => c.to_lowercase().map(Token::Lit).collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect();

    // reachable[j]: the first i tokens can consume the first j characters
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        match token {
            Token::Any => {
                let mut seen = false;
                for j in 0..=text.len() {
                    seen |= reachable[j];
                    next[j] = seen;
                }
            }
            Token::One => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1];
                }
            }
            Token::Lit(c) => {
                for j in 1..=text.len() {
                    next[j] = reachable[j - 1] && text[j - 1] == *c;
                }
            }
        }
        reachable = next;
    }
    reachable[text.len()]
}
