//! Repository over a relational table store.
//!
//! Filters, ordering and paging are translated into the store's native
//! query and executed server-side.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::backend::table::{Predicate, PredicateOp, Row, TableClient, TableQuery};
use crate::error::{BackendError, RepoError, RepoResult};
use crate::query::{FilterOperator, FilterOption, ListOptions, QueryError};
use crate::repository::Repository;
use crate::value::FilterValue;

/// Related rows attached to each result under `field`, looked up in `table`
/// by the id stored in `foreign_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Embed {
    pub field: &'static str,
    pub table: &'static str,
    pub foreign_key: &'static str,
}

/// Static description of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub table: &'static str,
    /// Entity name used in errors and logs.
    pub entity: &'static str,
    /// Columns callers may filter and sort on, besides the generated ones.
    pub columns: &'static [&'static str],
    /// Columns matched by the free-text search term.
    pub searchable: &'static [&'static str],
    pub embeds: &'static [Embed],
}

const GENERATED: [&str; 3] = ["id", "created_at", "updated_at"];

impl TableSpec {
    #[must_use]
    pub fn allows(&self, column: &str) -> bool {
        GENERATED.contains(&column) || self.columns.contains(&column)
    }
}

pub struct TableRepository<W, R> {
    client: Arc<dyn TableClient>,
    spec: &'static TableSpec,
    _types: PhantomData<fn(W) -> R>,
}

impl<W, R> TableRepository<W, R> {
    pub fn new(client: Arc<dyn TableClient>, spec: &'static TableSpec) -> Self {
        Self {
            client,
            spec,
            _types: PhantomData,
        }
    }

    #[must_use]
    pub fn spec(&self) -> &'static TableSpec {
        self.spec
    }

    fn backend(&self, err: BackendError) -> RepoError {
        RepoError::from_backend(self.spec.entity, err)
    }

    fn check_column(&self, column: &str) -> Result<(), QueryError> {
        if self.spec.allows(column) {
            Ok(())
        } else {
            Err(QueryError::UnknownField(column.to_owned()))
        }
    }

    /// Translate caller filters into native predicates, rejecting anything
    /// outside the whitelist before a single call is made.
    fn predicates(&self, filters: &[FilterOption]) -> Result<Vec<Predicate>, QueryError> {
        filters
            .iter()
            .map(|f| {
                f.validate()?;
                self.check_column(&f.field)?;
                Ok(to_predicate(f))
            })
            .collect()
    }

    fn base_query(&self, opts: &ListOptions) -> Result<TableQuery, QueryError> {
        opts.validate()?;
        let mut query = TableQuery::new();
        query.filters = self.predicates(&opts.filters)?;
        if let Some(sort_by) = opts.sort_by.as_deref() {
            self.check_column(sort_by)?;
            query = query.order(sort_by, opts.sort_order.is_ascending());
        }
        Ok(query)
    }

    fn id_filter(id: Uuid) -> Vec<Predicate> {
        vec![Predicate::equals("id", Value::String(id.to_string()))]
    }
}

impl<W, R> TableRepository<W, R>
where
    W: Serialize,
    R: DeserializeOwned,
{
    fn to_row(&self, input: &W) -> RepoResult<Row> {
        match serde_json::to_value(input) {
            Ok(Value::Object(row)) => Ok(row),
            Ok(other) => Err(RepoError::internal(format!(
                "{} payload must serialize to an object, got {other}",
                self.spec.entity
            ))),
            Err(e) => Err(RepoError::internal(format!(
                "cannot serialize {} payload: {e}",
                self.spec.entity
            ))),
        }
    }

    fn decode(&self, row: Row) -> RepoResult<R> {
        serde_json::from_value(Value::Object(row))
            .map_err(|e| self.backend(BackendError::Decode(e.to_string())))
    }

    /// Fetch the related rows of every embed with one `In` query each.
    async fn attach_embeds(&self, rows: &mut [Row]) -> RepoResult<()> {
        for embed in self.spec.embeds {
            let keys: Vec<Value> = rows
                .iter()
                .filter_map(|r| r.get(embed.foreign_key))
                .filter(|v| !v.is_null())
                .cloned()
                .collect();
            if keys.is_empty() {
                continue;
            }
            let query = TableQuery::new().filter(Predicate::new(
                "id",
                PredicateOp::In,
                Value::Array(keys),
            ));
            let related: HashMap<String, Row> = self
                .client
                .select(embed.table, &query)
                .await
                .map_err(|e| self.backend(e))?
                .into_iter()
                .filter_map(|r| r.get("id").map(value_key).map(|k| (k, r)))
                .collect();
            for row in rows.iter_mut() {
                let found = row
                    .get(embed.foreign_key)
                    .map(value_key)
                    .and_then(|k| related.get(&k).cloned())
                    .map_or(Value::Null, Value::Object);
                row.insert(embed.field.to_owned(), found);
            }
        }
        Ok(())
    }

    async fn decode_all(&self, mut rows: Vec<Row>) -> RepoResult<Vec<R>> {
        self.attach_embeds(&mut rows).await?;
        rows.into_iter().map(|r| self.decode(r)).collect()
    }

    async fn decode_one(&self, row: Row) -> RepoResult<R> {
        let mut rows = self.decode_all(vec![row]).await?;
        rows.pop()
            .ok_or_else(|| RepoError::internal("decoded row went missing"))
    }
}

#[async_trait]
impl<W, R> Repository<W, R> for TableRepository<W, R>
where
    W: Serialize + Send + Sync + 'static,
    R: DeserializeOwned + Send + Sync + 'static,
{
    #[instrument(skip_all, fields(table = self.spec.table))]
    async fn create(&self, input: W) -> RepoResult<R> {
        let mut row = self.to_row(&input)?;
        let now = Value::String(Utc::now().to_rfc3339());
        row.insert("id".to_owned(), Value::String(Uuid::now_v7().to_string()));
        row.insert("created_at".to_owned(), now.clone());
        row.insert("updated_at".to_owned(), now);
        let stored = self
            .client
            .insert(self.spec.table, row)
            .await
            .map_err(|e| self.backend(e))?;
        debug!(
            id = %stored.get("id").map(value_key).unwrap_or_default(),
            "row inserted"
        );
        self.decode_one(stored).await
    }

    #[instrument(skip(self), fields(table = self.spec.table))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<R> {
        let query = TableQuery {
            filters: Self::id_filter(id),
            range: Some((0, 0)),
            ..TableQuery::default()
        };
        let row = self
            .client
            .select(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::not_found(self.spec.entity, id))?;
        self.decode_one(row).await
    }

    #[instrument(skip(self, input), fields(table = self.spec.table))]
    async fn update(&self, id: Uuid, input: W) -> RepoResult<R> {
        let mut patch = self.to_row(&input)?;
        patch.remove("id");
        patch.remove("created_at");
        patch.insert(
            "updated_at".to_owned(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let row = self
            .client
            .update(self.spec.table, &Self::id_filter(id), patch)
            .await
            .map_err(|e| self.backend(e))?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::not_found(self.spec.entity, id))?;
        self.decode_one(row).await
    }

    #[instrument(skip(self), fields(table = self.spec.table))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let removed = self
            .client
            .delete(self.spec.table, &Self::id_filter(id))
            .await
            .map_err(|e| self.backend(e))?;
        if removed == 0 {
            return Err(RepoError::not_found(self.spec.entity, id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(table = self.spec.table))]
    async fn exists(&self, id: Uuid) -> RepoResult<bool> {
        let query = TableQuery {
            filters: Self::id_filter(id),
            ..TableQuery::default()
        };
        let n = self
            .client
            .count(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))?;
        Ok(n > 0)
    }

    #[instrument(skip(self, value), fields(table = self.spec.table))]
    async fn find_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<R>> {
        let query = TableQuery {
            filters: self.predicates(&[FilterOption::equal(field, value)])?,
            ..TableQuery::default()
        };
        let rows = self
            .client
            .select(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))?;
        self.decode_all(rows).await
    }

    #[instrument(skip_all, fields(table = self.spec.table, page = opts.page, per_page = opts.per_page))]
    async fn list(&self, opts: &ListOptions) -> RepoResult<Vec<R>> {
        let (from, to) = opts.range();
        let query = self.base_query(opts)?.range(from, to);
        let rows = self
            .client
            .select(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))?;
        self.decode_all(rows).await
    }

    #[instrument(skip_all, fields(table = self.spec.table))]
    async fn count(&self, filters: &[FilterOption]) -> RepoResult<u64> {
        let query = TableQuery {
            filters: self.predicates(filters)?,
            ..TableQuery::default()
        };
        self.client
            .count(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))
    }

    #[instrument(skip_all, fields(table = self.spec.table, page = opts.page, per_page = opts.per_page))]
    async fn search(&self, opts: &ListOptions) -> RepoResult<(Vec<R>, u64)> {
        let mut query = self.base_query(opts)?;
        if let Some(term) = opts.search_term() {
            if self.spec.searchable.is_empty() {
                return Err(RepoError::validation(format!(
                    "table '{}' has no searchable columns",
                    self.spec.table
                )));
            }
            let pattern = Value::String(like_contains(term));
            query = query.or(self
                .spec
                .searchable
                .iter()
                .map(|column| Predicate::new(*column, PredicateOp::ILike, pattern.clone()))
                .collect());
        }
        // total is taken before the page window narrows the query
        let total = self
            .client
            .count(self.spec.table, &query)
            .await
            .map_err(|e| self.backend(e))?;
        let (from, to) = opts.range();
        let rows = self
            .client
            .select(self.spec.table, &query.range(from, to))
            .await
            .map_err(|e| self.backend(e))?;
        debug!(total, returned = rows.len(), "search complete");
        Ok((self.decode_all(rows).await?, total))
    }
}

/* ---------- filter translation ---------- */

fn to_predicate(filter: &FilterOption) -> Predicate {
    let text = || filter.value.as_text().unwrap_or_default();
    let (op, value) = match filter.operator {
        FilterOperator::Equal => (PredicateOp::Eq, filter.value.to_json()),
        FilterOperator::NotEqual => (PredicateOp::Neq, filter.value.to_json()),
        FilterOperator::GreaterThan => (PredicateOp::Gt, filter.value.to_json()),
        FilterOperator::LessThan => (PredicateOp::Lt, filter.value.to_json()),
        FilterOperator::GreaterEqual => (PredicateOp::Gte, filter.value.to_json()),
        FilterOperator::LessEqual => (PredicateOp::Lte, filter.value.to_json()),
        FilterOperator::In => (PredicateOp::In, filter.value.to_json()),
        FilterOperator::NotIn => (PredicateOp::NotIn, filter.value.to_json()),
        FilterOperator::Like => (PredicateOp::ILike, Value::String(like_contains(&text()))),
        FilterOperator::StartsWith => (PredicateOp::ILike, Value::String(like_starts(&text()))),
        FilterOperator::EndsWith => (PredicateOp::ILike, Value::String(like_ends(&text()))),
    };
    Predicate::new(filter.field.clone(), op, value)
}

fn value_key(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}

/* ---------- LIKE helpers ---------- */

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn like_contains(s: &str) -> String {
    format!("%{}%", like_escape(s))
}

fn like_starts(s: &str) -> String {
    format!("{}%", like_escape(s))
}

fn like_ends(s: &str) -> String {
    format!("%{}", like_escape(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::inmem::MemoryTableClient;
    use crate::query::SortOrder;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize)]
    struct NewTag {
        label: String,
        weight: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Tag {
        id: Uuid,
        label: String,
        weight: i64,
    }

    #[derive(Debug, Clone, Serialize)]
    struct NewLink {
        tag_id: Uuid,
        note: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    struct Link {
        note: String,
        tag: Option<Tag>,
    }

    static TAGS: TableSpec = TableSpec {
        table: "tags",
        entity: "tag",
        columns: &["label", "weight"],
        searchable: &["label"],
        embeds: &[],
    };

    static LINKS: TableSpec = TableSpec {
        table: "links",
        entity: "link",
        columns: &["tag_id", "note"],
        searchable: &["note"],
        embeds: &[Embed {
            field: "tag",
            table: "tags",
            foreign_key: "tag_id",
        }],
    };

    fn tag(label: &str, weight: i64) -> NewTag {
        NewTag {
            label: label.to_owned(),
            weight,
        }
    }

    async fn seeded() -> (Arc<MemoryTableClient>, TableRepository<NewTag, Tag>) {
        let client = Arc::new(MemoryTableClient::new().with_unique("tags", &["label"]));
        let repo = TableRepository::new(client.clone(), &TAGS);
        repo.bulk_create(vec![
            tag("rust", 5),
            tag("rustacean", 3),
            tag("go_lang", 1),
            tag("zig", 4),
        ])
        .await
        .unwrap();
        (client, repo)
    }

    #[test]
    fn like_input_is_escaped() {
        assert_eq!(like_contains("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_starts("a\\b"), "a\\\\b%");
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let (_, repo) = seeded().await;
        let created = repo.create(tag("carbon", 2)).await.unwrap();
        assert_eq!(repo.find_by_id(created.id).await.unwrap().label, "carbon");

        let updated = repo.update(created.id, tag("carbon", 7)).await.unwrap();
        assert_eq!(updated.weight, 7);

        repo.delete(created.id).await.unwrap();
        assert!(!repo.exists(created.id).await.unwrap());
        let err = repo.find_by_id(created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = repo.delete(created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn every_operator_translates() {
        let (_, repo) = seeded().await;
        let cases = [
            (FilterOption::new("weight", FilterOperator::GreaterThan, 3_i64), 2),
            (FilterOption::new("weight", FilterOperator::LessEqual, 3_i64), 2),
            (FilterOption::new("label", FilterOperator::NotEqual, "zig"), 3),
            (FilterOption::new("label", FilterOperator::In, vec!["zig", "rust"]), 2),
            (FilterOption::new("label", FilterOperator::StartsWith, "RUST"), 2),
            (FilterOption::new("label", FilterOperator::EndsWith, "cean"), 1),
            (FilterOption::like("label", "o_l"), 1),
        ];
        for (filter, expected) in cases {
            let n = repo.count(std::slice::from_ref(&filter)).await.unwrap();
            assert_eq!(n, expected, "{}", filter.operator);
        }
    }

    #[tokio::test]
    async fn list_sorts_and_windows() {
        let (_, repo) = seeded().await;
        let opts = ListOptions::default()
            .with_sort("weight", SortOrder::Asc)
            .with_per_page(2)
            .with_page(2)
            .normalize()
            .unwrap();
        let page = repo.list(&opts).await.unwrap();
        let labels: Vec<_> = page.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["zig", "rust"]);
    }

    #[tokio::test]
    async fn search_total_matches_count_without_term() {
        let (_, repo) = seeded().await;
        let opts = ListOptions::default().with_per_page(1).normalize().unwrap();
        let (items, total) = repo.search(&opts).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(total, repo.count(&[]).await.unwrap());
    }

    #[tokio::test]
    async fn search_counts_before_windowing() {
        let (_, repo) = seeded().await;
        let opts = ListOptions::default()
            .with_search("RUST")
            .with_per_page(1)
            .normalize()
            .unwrap();
        let (items, total) = repo.search(&opts).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn unknown_fields_fail_before_io() {
        let (client, repo) = seeded().await;
        let calls = client.call_count();

        let err = repo
            .count(&[FilterOption::equal("password", "x")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let opts = ListOptions::default().with_sort("secret", SortOrder::Asc);
        let err = repo.list(&opts).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(client.call_count(), calls);
    }

    #[tokio::test]
    async fn unique_violation_is_conflict() {
        let (_, repo) = seeded().await;
        let err = repo.create(tag("zig", 9)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn bulk_create_stops_at_first_failure() {
        let (client, repo) = seeded().await;
        let err = repo
            .bulk_create(vec![tag("nim", 1), tag("zig", 1), tag("odin", 1)])
            .await
            .unwrap_err();
        assert_eq!(err.bulk_index(), Some(1));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(client.row_count("tags"), 5);
    }

    #[tokio::test]
    async fn bulk_update_keeps_applied_elements() {
        let (_, repo) = seeded().await;
        let rust = repo.find_by_field("label", "rust".into()).await.unwrap()[0].clone();
        let zig = repo.find_by_field("label", "zig".into()).await.unwrap()[0].clone();

        let err = repo
            .bulk_update(vec![
                (rust.id, tag("rust", 50)),
                (Uuid::now_v7(), tag("ghost", 0)),
                (zig.id, tag("zig", 40)),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.bulk_index(), Some(1));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(repo.find_by_id(rust.id).await.unwrap().weight, 50);
        assert_eq!(repo.find_by_id(zig.id).await.unwrap().weight, 4);
    }

    #[tokio::test]
    async fn bulk_delete_keeps_applied_elements() {
        let (client, repo) = seeded().await;
        let rust = repo.find_by_field("label", "rust".into()).await.unwrap()[0].clone();
        let zig = repo.find_by_field("label", "zig".into()).await.unwrap()[0].clone();

        let err = repo
            .bulk_delete(&[rust.id, Uuid::now_v7(), zig.id])
            .await
            .unwrap_err();
        assert_eq!(err.bulk_index(), Some(1));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!repo.exists(rust.id).await.unwrap());
        assert!(repo.exists(zig.id).await.unwrap());
        assert_eq!(client.row_count("tags"), 3);
    }

    #[tokio::test]
    async fn search_term_without_searchable_columns_is_rejected() {
        static PLAIN: TableSpec = TableSpec {
            table: "plain_tags",
            entity: "tag",
            columns: &["label", "weight"],
            searchable: &[],
            embeds: &[],
        };
        let client = Arc::new(MemoryTableClient::new());
        let repo: TableRepository<NewTag, Tag> = TableRepository::new(client.clone(), &PLAIN);
        repo.bulk_create(vec![tag("alpha", 1), tag("beta", 2), tag("gamma", 3)])
            .await
            .unwrap();
        let calls = client.call_count();

        let opts = ListOptions::default()
            .with_search("zzz-no-match")
            .normalize()
            .unwrap();
        let err = repo.search(&opts).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("plain_tags"));
        assert_eq!(client.call_count(), calls);

        let (items, total) = repo
            .search(&ListOptions::default().normalize().unwrap())
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn embeds_are_joined() {
        let (client, tags) = seeded().await;
        let rust = tags
            .find_by_field("label", "rust".into())
            .await
            .unwrap()
            .remove(0);
        let links: TableRepository<NewLink, Link> = TableRepository::new(client, &LINKS);
        links
            .create(NewLink {
                tag_id: rust.id,
                note: "systems".to_owned(),
            })
            .await
            .unwrap();
        let all = links.list(&ListOptions::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].note, "systems");
        assert_eq!(all[0].tag.as_ref().unwrap().label, "rust");
    }

    #[tokio::test]
    async fn backend_outage_is_backend_error() {
        let (client, repo) = seeded().await;
        client.set_available(false);
        let err = repo.count(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }
}
