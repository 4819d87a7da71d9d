//! Repository over the identity directory.
//!
//! The directory can only list users page by page, so every query scans its
//! native pagination and evaluates filters, search and ordering in memory.
//! Among equal sort keys the directory's own order is kept, which can differ
//! from the order a table store would produce for the same keys.

use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::backend::directory::{DirectoryClient, DirectoryUser, UserAttributes};
use crate::error::{BackendError, RepoError, RepoResult};
use crate::query::{FilterOperator, FilterOption, ListOptions, QueryError};
use crate::repository::Repository;
use crate::value::FilterValue;

pub const DEFAULT_SCAN_PAGE_SIZE: u32 = 100;

/// Fields a directory query may filter or sort on.
pub const DIRECTORY_FIELDS: &[&str] = &[
    "id",
    "email",
    "phone",
    "display_name",
    "email_confirmed",
    "created_at",
    "updated_at",
    "last_sign_in_at",
];

const SEARCH_FIELDS: &[&str] = &["email", "display_name", "phone"];

/// Converts between an entity's models and directory records.
pub trait DirectoryMapping: Send + Sync + 'static {
    type Write: Send + Sync + 'static;
    type Read: Send + Sync + 'static;

    const ENTITY: &'static str;

    fn attributes(input: Self::Write) -> UserAttributes;

    fn read(user: DirectoryUser) -> Self::Read;
}

pub struct DirectoryRepository<M> {
    client: Arc<dyn DirectoryClient>,
    scan_page_size: u32,
    _mapping: PhantomData<fn() -> M>,
}

impl<M: DirectoryMapping> DirectoryRepository<M> {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self {
            client,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            _mapping: PhantomData,
        }
    }

    #[must_use]
    pub fn with_scan_page_size(mut self, size: u32) -> Self {
        self.scan_page_size = size.max(1);
        self
    }

    fn backend(err: BackendError, id: Option<Uuid>) -> RepoError {
        match (err, id) {
            (BackendError::NotFound, Some(id)) => RepoError::not_found(M::ENTITY, id),
            (err, _) => RepoError::from_backend(M::ENTITY, err),
        }
    }

    /// Read directory pages until an empty one comes back or the reported
    /// total has been collected. The directory may cap the page size below the
    /// requested one, so a short page does not end the scan.
    async fn scan(&self) -> RepoResult<Vec<DirectoryUser>> {
        let mut all = Vec::new();
        let mut reported = None;
        let mut page = 1;
        loop {
            let batch = self
                .client
                .list_users(page, self.scan_page_size)
                .await
                .map_err(|e| Self::backend(e, None))?;
            reported = batch.total.or(reported);
            if batch.users.is_empty() {
                break;
            }
            all.extend(batch.users);
            if reported.is_some_and(|total| all.len() as u64 >= total) {
                break;
            }
            page += 1;
        }
        if let Some(total) = reported
            && total != all.len() as u64
        {
            warn!(reported = total, scanned = all.len(), "directory total disagrees with scan");
        }
        debug!(pages = page, users = all.len(), "directory scanned");
        Ok(all)
    }

    /// Scan, filter, optionally search and sort. Returns every match.
    async fn matching(
        &self,
        filters: &[FilterOption],
        search: Option<&str>,
        sort: Option<(&str, bool)>,
    ) -> RepoResult<Vec<DirectoryUser>> {
        check_filters(filters)?;
        if let Some((field, _)) = sort {
            check_field(field)?;
        }
        let needle = search.map(str::to_lowercase);
        let mut users: Vec<DirectoryUser> = self
            .scan()
            .await?
            .into_iter()
            .filter(|u| filters.iter().all(|f| filter_matches(u, f)))
            .filter(|u| needle.as_deref().is_none_or(|n| search_matches(u, n)))
            .collect();
        if let Some((field, ascending)) = sort {
            users.sort_by(|a, b| {
                let ord = compare_field(a, b, field);
                if ascending { ord } else { ord.reverse() }
            });
        }
        Ok(users)
    }

    fn window(users: Vec<DirectoryUser>, opts: &ListOptions) -> Vec<M::Read> {
        let skip = usize::try_from(opts.offset()).unwrap_or(usize::MAX);
        users
            .into_iter()
            .skip(skip)
            .take(opts.per_page as usize)
            .map(M::read)
            .collect()
    }
}

#[async_trait]
impl<M: DirectoryMapping> Repository<M::Write, M::Read> for DirectoryRepository<M> {
    #[instrument(skip_all, fields(entity = M::ENTITY))]
    async fn create(&self, input: M::Write) -> RepoResult<M::Read> {
        let user = self
            .client
            .create_user(M::attributes(input))
            .await
            .map_err(|e| Self::backend(e, None))?;
        debug!(id = %user.id, "directory user created");
        Ok(M::read(user))
    }

    #[instrument(skip(self), fields(entity = M::ENTITY))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<M::Read> {
        self.client
            .get_user(id)
            .await
            .map(M::read)
            .map_err(|e| Self::backend(e, Some(id)))
    }

    #[instrument(skip(self, input), fields(entity = M::ENTITY))]
    async fn update(&self, id: Uuid, input: M::Write) -> RepoResult<M::Read> {
        self.client
            .update_user(id, M::attributes(input))
            .await
            .map(M::read)
            .map_err(|e| Self::backend(e, Some(id)))
    }

    #[instrument(skip(self), fields(entity = M::ENTITY))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        self.client
            .delete_user(id)
            .await
            .map_err(|e| Self::backend(e, Some(id)))
    }

    #[instrument(skip(self), fields(entity = M::ENTITY))]
    async fn exists(&self, id: Uuid) -> RepoResult<bool> {
        match self.client.get_user(id).await {
            Ok(_) => Ok(true),
            Err(BackendError::NotFound) => Ok(false),
            Err(e) => Err(Self::backend(e, Some(id))),
        }
    }

    #[instrument(skip(self, value), fields(entity = M::ENTITY))]
    async fn find_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<M::Read>> {
        let users = self
            .matching(&[FilterOption::equal(field, value)], None, None)
            .await?;
        Ok(users.into_iter().map(M::read).collect())
    }

    #[instrument(skip_all, fields(entity = M::ENTITY, page = opts.page, per_page = opts.per_page))]
    async fn list(&self, opts: &ListOptions) -> RepoResult<Vec<M::Read>> {
        opts.validate()?;
        let users = self
            .matching(&opts.filters, None, sort_of(opts))
            .await?;
        Ok(Self::window(users, opts))
    }

    #[instrument(skip_all, fields(entity = M::ENTITY))]
    async fn count(&self, filters: &[FilterOption]) -> RepoResult<u64> {
        let users = self.matching(filters, None, None).await?;
        Ok(users.len() as u64)
    }

    #[instrument(skip_all, fields(entity = M::ENTITY, page = opts.page, per_page = opts.per_page))]
    async fn search(&self, opts: &ListOptions) -> RepoResult<(Vec<M::Read>, u64)> {
        opts.validate()?;
        let users = self
            .matching(&opts.filters, opts.search_term(), sort_of(opts))
            .await?;
        let total = users.len() as u64;
        Ok((Self::window(users, opts), total))
    }
}

fn sort_of(opts: &ListOptions) -> Option<(&str, bool)> {
    opts.sort_by
        .as_deref()
        .map(|field| (field, opts.sort_order.is_ascending()))
}

fn check_field(field: &str) -> Result<(), QueryError> {
    if DIRECTORY_FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(QueryError::UnknownField(field.to_owned()))
    }
}

fn check_filters(filters: &[FilterOption]) -> Result<(), QueryError> {
    for f in filters {
        f.validate()?;
        check_field(&f.field)?;
        if !matches!(f.operator, FilterOperator::Equal | FilterOperator::Like) {
            return Err(QueryError::UnsupportedOperator {
                field: f.field.clone(),
                operator: f.operator,
                backend: "directory",
            });
        }
    }
    Ok(())
}

fn field_value(user: &DirectoryUser, field: &str) -> FilterValue {
    let opt_text = |s: Option<&str>| s.map_or(FilterValue::Null, FilterValue::from);
    match field {
        "id" => FilterValue::Uuid(user.id),
        "email" => FilterValue::from(user.email.as_str()),
        "phone" => opt_text(user.phone.as_deref()),
        "display_name" => opt_text(
            user.user_metadata
                .get("display_name")
                .and_then(serde_json::Value::as_str),
        ),
        "email_confirmed" => FilterValue::Bool(user.email_confirmed_at.is_some()),
        "created_at" => FilterValue::Timestamp(user.created_at),
        "updated_at" => FilterValue::Timestamp(user.updated_at),
        "last_sign_in_at" => user
            .last_sign_in_at
            .map_or(FilterValue::Null, FilterValue::Timestamp),
        _ => FilterValue::Null,
    }
}

fn contains_ignore_case(haystack: &FilterValue, needle_lower: &str) -> bool {
    haystack
        .as_text()
        .is_some_and(|text| text.to_lowercase().contains(needle_lower))
}

fn filter_matches(user: &DirectoryUser, filter: &FilterOption) -> bool {
    let actual = field_value(user, &filter.field);
    match filter.operator {
        FilterOperator::Equal => actual.equals(&filter.value),
        FilterOperator::Like => filter
            .value
            .as_text()
            .is_some_and(|needle| contains_ignore_case(&actual, &needle.to_lowercase())),
        _ => false,
    }
}

fn search_matches(user: &DirectoryUser, needle_lower: &str) -> bool {
    SEARCH_FIELDS
        .iter()
        .any(|field| contains_ignore_case(&field_value(user, field), needle_lower))
}

/// Nulls sort last ascending.
fn compare_field(a: &DirectoryUser, b: &DirectoryUser, field: &str) -> Ordering {
    let (x, y) = (field_value(a, field), field_value(b, field));
    match (x.is_null(), y.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.compare(&y).unwrap_or(Ordering::Equal),
    }
}
