//! Domain services, one per resource, plus the badge awarder that reacts to
//! profile events.

mod awarder;
mod badges;
mod profiles;
mod users;

pub use awarder::{BadgeAwarder, GrantOutcome};
pub use badges::BadgesService;
pub use profiles::ProfilesService;
pub use users::UsersService;

use storekit::{ListOptions, Page, QueryConfig, Repository};

use crate::domain::error::DomainError;

/// One page of `repo.list` under the module's query limits, with the total
/// of matching records.
async fn list_page<W, R>(
    repo: &dyn Repository<W, R>,
    query: &QueryConfig,
    opts: ListOptions,
) -> Result<Page<R>, DomainError>
where
    W: Send + 'static,
    R: Send + 'static,
{
    let opts = opts.with_limits(query).normalize()?;
    let total = repo.count(&opts.filters).await?;
    let items = repo.list(&opts).await?;
    Ok(Page::new(items, total, &opts))
}

/// One page of `repo.search` under the module's query limits.
async fn search_page<W, R>(
    repo: &dyn Repository<W, R>,
    query: &QueryConfig,
    opts: ListOptions,
) -> Result<Page<R>, DomainError>
where
    W: Send + 'static,
    R: Send + 'static,
{
    let opts = opts.with_limits(query).normalize()?;
    let (items, total) = repo.search(&opts).await?;
    Ok(Page::new(items, total, &opts))
}
