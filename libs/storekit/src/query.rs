//! List/filter/sort/paginate query model.
//!
//! `ListOptions` is built per request from explicit [`QueryConfig`] limits,
//! normalized once, and then handed to a repository adapter which translates
//! it into its backend's native query shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::FilterValue;

/// Errors produced while parsing or validating a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid sort order '{0}' (expected 'asc' or 'desc')")]
    InvalidSortOrder(String),

    #[error("filter field must not be empty")]
    EmptyField,

    #[error("filter operator must not be empty")]
    EmptyOperator,

    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("sort field must not be blank")]
    EmptySortField,

    #[error("operator '{operator}' on '{field}' expects {expected}, got {got}")]
    InvalidValue {
        field: String,
        operator: FilterOperator,
        expected: &'static str,
        got: &'static str,
    },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("operator '{operator}' on '{field}' is not supported by the {backend} backend")]
    UnsupportedOperator {
        field: String,
        operator: FilterOperator,
        backend: &'static str,
    },
}

/// Page size defaults and limits, passed explicitly into the query model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
    pub default_sort_field: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 100,
            default_sort_field: "created_at".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Asc,
    #[default]
    #[serde(rename = "desc")]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn is_ascending(self) -> bool {
        matches!(self, SortOrder::Asc)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(QueryError::InvalidSortOrder(s.to_owned())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    In,
    NotIn,
    Like,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    pub const ALL: &'static [FilterOperator] = &[
        FilterOperator::Equal,
        FilterOperator::NotEqual,
        FilterOperator::GreaterThan,
        FilterOperator::LessThan,
        FilterOperator::GreaterEqual,
        FilterOperator::LessEqual,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Like,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equal => "eq",
            FilterOperator::NotEqual => "neq",
            FilterOperator::GreaterThan => "gt",
            FilterOperator::LessThan => "lt",
            FilterOperator::GreaterEqual => "gte",
            FilterOperator::LessEqual => "lte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "nin",
            FilterOperator::Like => "like",
            FilterOperator::StartsWith => "startswith",
            FilterOperator::EndsWith => "endswith",
        }
    }

    /// Operators that take a text pattern.
    #[must_use]
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            FilterOperator::Like | FilterOperator::StartsWith | FilterOperator::EndsWith
        )
    }

    /// Operators that take a list of values.
    #[must_use]
    pub fn is_set(self) -> bool {
        matches!(self, FilterOperator::In | FilterOperator::NotIn)
    }
}

impl FromStr for FilterOperator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "" => return Err(QueryError::EmptyOperator),
            "eq" | "equal" | "=" => FilterOperator::Equal,
            "neq" | "ne" | "not_equal" | "!=" => FilterOperator::NotEqual,
            "gt" | "greater_than" | ">" => FilterOperator::GreaterThan,
            "lt" | "less_than" | "<" => FilterOperator::LessThan,
            "gte" | "ge" | "greater_equal" | ">=" => FilterOperator::GreaterEqual,
            "lte" | "le" | "less_equal" | "<=" => FilterOperator::LessEqual,
            "in" => FilterOperator::In,
            "nin" | "not_in" => FilterOperator::NotIn,
            "like" | "contains" => FilterOperator::Like,
            "startswith" | "starts_with" => FilterOperator::StartsWith,
            "endswith" | "ends_with" => FilterOperator::EndsWith,
            _ => return Err(QueryError::UnknownOperator(s.to_owned())),
        })
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field operator value` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterOption {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn equal(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    pub fn like(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(needle.into()))
    }

    /// Build a filter from raw request parts.
    ///
    /// # Errors
    /// Fails on an empty field or operator, an unknown operator, or a value
    /// whose shape does not fit the operator.
    pub fn parse(field: &str, operator: &str, value: FilterValue) -> Result<Self, QueryError> {
        if field.trim().is_empty() {
            return Err(QueryError::EmptyField);
        }
        let operator = operator.parse::<FilterOperator>()?;
        let filter = Self {
            field: field.trim().to_owned(),
            operator,
            value,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// # Errors
    /// Returns `QueryError` when the field is blank or the value shape does
    /// not match the operator.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.field.trim().is_empty() {
            return Err(QueryError::EmptyField);
        }
        let expected = if self.operator.is_set() {
            (!matches!(self.value, FilterValue::List(_))).then_some("a list")
        } else if self.operator.is_pattern() {
            (!matches!(self.value, FilterValue::String(_))).then_some("a string")
        } else {
            matches!(self.value, FilterValue::List(_)).then_some("a single value")
        };
        match expected {
            Some(expected) => Err(QueryError::InvalidValue {
                field: self.field.clone(),
                operator: self.operator,
                expected,
                got: self.value.type_name(),
            }),
            None => Ok(()),
        }
    }
}

/// Raw filter as it arrives on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParam {
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Raw list parameters as they arrive on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub filters: Vec<FilterParam>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageLimits {
    default_per_page: u32,
    max_per_page: u32,
}

impl From<&QueryConfig> for PageLimits {
    fn from(cfg: &QueryConfig) -> Self {
        Self {
            default_per_page: cfg.default_per_page.max(1),
            max_per_page: cfg.max_per_page.max(1),
        }
    }
}

/// Query descriptor for list and search operations.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ListOptions {
    pub page: u32,
    pub per_page: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub filters: Vec<FilterOption>,
    pub search: Option<String>,
    limits: PageLimits,
    default_sort: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(&QueryConfig::default())
    }
}

impl ListOptions {
    pub fn new(cfg: &QueryConfig) -> Self {
        let limits = PageLimits::from(cfg);
        let default_sort = default_sort_of(cfg);
        Self {
            page: 1,
            per_page: limits.default_per_page,
            sort_by: default_sort.clone(),
            sort_order: SortOrder::default(),
            filters: Vec::new(),
            search: None,
            limits,
            default_sort,
        }
    }

    /// Re-target the options at `cfg`. A page size or sort field still at the
    /// previous defaults takes the new defaults; explicit values are kept and
    /// clamped by [`ListOptions::normalize`].
    pub fn with_limits(mut self, cfg: &QueryConfig) -> Self {
        let limits = PageLimits::from(cfg);
        let default_sort = default_sort_of(cfg);
        if self.per_page == self.limits.default_per_page {
            self.per_page = limits.default_per_page;
        }
        if self.sort_by.is_some() && self.sort_by == self.default_sort {
            self.sort_by.clone_from(&default_sort);
        }
        self.limits = limits;
        self.default_sort = default_sort;
        self
    }

    /// Parse raw wire parameters and normalize the result.
    ///
    /// # Errors
    /// Returns `QueryError` for an unknown sort order, a malformed filter, or a
    /// blank sort field.
    pub fn from_params(params: ListParams, cfg: &QueryConfig) -> Result<Self, QueryError> {
        let mut opts = Self::new(cfg);
        if let Some(page) = params.page {
            opts.page = clamp_to_u32(page);
        }
        if let Some(per_page) = params.per_page {
            opts.per_page = clamp_to_u32(per_page);
        }
        if let Some(sort_by) = params.sort_by {
            opts.sort_by = Some(sort_by);
        }
        if let Some(order) = params.sort_order.as_deref() {
            opts.sort_order = order.parse()?;
        }
        opts.search = params.search;
        opts.filters = params
            .filters
            .iter()
            .map(|f| FilterOption::parse(&f.field, &f.operator, FilterValue::from_json(&f.value)))
            .collect::<Result<_, _>>()?;
        opts.normalize()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = order;
        self
    }

    pub fn without_sort(mut self) -> Self {
        self.sort_by = None;
        self
    }

    pub fn with_filter(mut self, filter: FilterOption) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Clamp paging into range, drop a blank search term, then validate.
    ///
    /// # Errors
    /// Returns the first `QueryError` found by [`ListOptions::validate`].
    pub fn normalize(mut self) -> Result<Self, QueryError> {
        if self.page < 1 {
            self.page = 1;
        }
        if self.per_page < 1 {
            self.per_page = self.limits.default_per_page;
        }
        if self.per_page > self.limits.max_per_page {
            self.per_page = self.limits.max_per_page;
        }
        self.search = self
            .search
            .take()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    /// Returns `QueryError` for a blank sort field or an invalid filter.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.sort_by.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(QueryError::EmptySortField);
        }
        self.filters.iter().try_for_each(FilterOption::validate)
    }

    /// Non-blank search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn has_search(&self) -> bool {
        self.search_term().is_some()
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    /// Inclusive row window `(page-1)*per_page ..= page*per_page-1`.
    #[must_use]
    pub fn range(&self) -> (u64, u64) {
        let from = self.offset();
        (from, from + u64::from(self.per_page.max(1)) - 1)
    }
}

fn default_sort_of(cfg: &QueryConfig) -> Option<String> {
    Some(cfg.default_sort_field.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
