//! Backend-agnostic repository contract.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RepoResult;
use crate::query::{FilterOption, ListOptions};
use crate::value::FilterValue;

/// CRUD, query and bulk operations over one entity.
///
/// `W` is the write model accepted on create/update, `R` the read model
/// returned to callers. Every adapter behaves the same way from the caller's
/// side regardless of how its backend executes the query.
#[async_trait]
pub trait Repository<W, R>: Send + Sync
where
    W: Send + 'static,
    R: Send + 'static,
{
    async fn create(&self, input: W) -> RepoResult<R>;

    /// Fails with `NotFound` when no record has this id.
    async fn find_by_id(&self, id: Uuid) -> RepoResult<R>;

    async fn update(&self, id: Uuid, input: W) -> RepoResult<R>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    async fn exists(&self, id: Uuid) -> RepoResult<bool>;

    async fn find_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<R>>;

    /// One page of records matching the filters. The search term is ignored.
    async fn list(&self, opts: &ListOptions) -> RepoResult<Vec<R>>;

    async fn count(&self, filters: &[FilterOption]) -> RepoResult<u64>;

    /// One page of records matching the filters and the search term, plus
    /// the total number of matches.
    async fn search(&self, opts: &ListOptions) -> RepoResult<(Vec<R>, u64)>;

    /// Sequential, stops on the first failure. Elements already created stay.
    async fn bulk_create(&self, inputs: Vec<W>) -> RepoResult<Vec<R>> {
        let mut out = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.into_iter().enumerate() {
            out.push(self.create(input).await.map_err(|e| e.at_index(index))?);
        }
        Ok(out)
    }

    /// Sequential, stops on the first failure. Elements already updated stay.
    async fn bulk_update(&self, inputs: Vec<(Uuid, W)>) -> RepoResult<Vec<R>> {
        let mut out = Vec::with_capacity(inputs.len());
        for (index, (id, input)) in inputs.into_iter().enumerate() {
            out.push(self.update(id, input).await.map_err(|e| e.at_index(index))?);
        }
        Ok(out)
    }

    /// Sequential, stops on the first failure. Elements already deleted stay.
    async fn bulk_delete(&self, ids: &[Uuid]) -> RepoResult<()> {
        for (index, id) in ids.iter().enumerate() {
            self.delete(*id).await.map_err(|e| e.at_index(index))?;
        }
        Ok(())
    }
}
