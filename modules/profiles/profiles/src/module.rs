//! Wiring of the profiles module: backends, repositories and services.

use std::sync::Arc;

use profiles_sdk::{Badge, NewBadge, ProfilesApi};
use storekit::backend::{BlobStore, DirectoryClient, TableClient};
use storekit::inmem::{MemoryBlobStore, MemoryDirectory, MemoryTableClient};
use storekit::{DirectoryRepository, TableRepository};
use tracing::{debug, info};

use crate::config::ProfilesConfig;
use crate::domain::error::DomainError;
use crate::domain::events::ProfileDomainEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repos::{BadgesRepo, GrantsRepo, ProfilesRepo, UsersRepo};
use crate::domain::rules::BadgeRules;
use crate::domain::service::{BadgeAwarder, BadgesService, ProfilesService, UsersService};
use crate::infra::storage::{BADGES, PROFILES, UNIQUE_CONSTRAINTS, USER_BADGES, UserMapping};
use crate::local_client::LocalProfilesClient;

/// Clients of the hosted services the module stores its data in.
#[derive(Clone)]
pub struct Backends {
    pub tables: Arc<dyn TableClient>,
    pub directory: Arc<dyn DirectoryClient>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// Process-local backends with the module's unique constraints in place.
    #[must_use]
    pub fn in_memory(public_base_url: &str) -> Self {
        let tables = UNIQUE_CONSTRAINTS
            .iter()
            .fold(MemoryTableClient::new(), |client, (table, columns)| {
                client.with_unique(table, columns)
            });
        Self {
            tables: Arc::new(tables),
            directory: Arc::new(MemoryDirectory::new()),
            blobs: Arc::new(MemoryBlobStore::new(public_base_url)),
        }
    }
}

pub struct ProfilesModule {
    config: ProfilesConfig,
    users: Arc<UsersService>,
    profiles: Arc<ProfilesService>,
    badges: Arc<BadgesService>,
    awarder: Arc<BadgeAwarder>,
}

impl ProfilesModule {
    #[must_use]
    pub fn build(
        config: ProfilesConfig,
        backends: &Backends,
        events: Arc<dyn EventPublisher<ProfileDomainEvent>>,
    ) -> Self {
        let users_repo: UsersRepo = Arc::new(
            DirectoryRepository::<UserMapping>::new(backends.directory.clone())
                .with_scan_page_size(config.directory.scan_page_size),
        );
        let profiles_repo: ProfilesRepo =
            Arc::new(TableRepository::new(backends.tables.clone(), &PROFILES));
        let badges_repo: BadgesRepo =
            Arc::new(TableRepository::new(backends.tables.clone(), &BADGES));
        let grants_repo: GrantsRepo =
            Arc::new(TableRepository::new(backends.tables.clone(), &USER_BADGES));

        let users = Arc::new(UsersService::new(users_repo, config.query.clone()));
        let badges = Arc::new(BadgesService::new(
            badges_repo,
            grants_repo,
            users.clone(),
            config.query.clone(),
        ));
        let rules = BadgeRules::from_config(&config.badges);
        debug!(empty = rules.is_empty(), "badge rules loaded");
        let awarder = Arc::new(BadgeAwarder::new(badges.clone(), rules));
        let profiles = Arc::new(ProfilesService::new(
            profiles_repo,
            users.clone(),
            backends.blobs.clone(),
            config.storage.clone(),
            config.query.clone(),
            awarder.clone(),
            events,
        ));

        info!("profiles module initialized");
        Self {
            config,
            users,
            profiles,
            badges,
            awarder,
        }
    }

    /// Make sure every badge named by the rule table exists.
    ///
    /// # Errors
    /// Propagates storage failures from the badge catalogue.
    pub async fn seed_rule_badges(&self) -> Result<Vec<Badge>, DomainError> {
        let cfg = &self.config.badges;
        self.badges
            .seed_badges(vec![
                NewBadge::named(cfg.explorer.as_str())
                    .with_description("Created a profile"),
                NewBadge::named(cfg.verified_locale.as_str())
                    .with_description("Verified their identity"),
            ])
            .await
    }

    #[must_use]
    pub fn config(&self) -> &ProfilesConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> Arc<UsersService> {
        self.users.clone()
    }

    #[must_use]
    pub fn profiles(&self) -> Arc<ProfilesService> {
        self.profiles.clone()
    }

    #[must_use]
    pub fn badges(&self) -> Arc<BadgesService> {
        self.badges.clone()
    }

    #[must_use]
    pub fn awarder(&self) -> Arc<BadgeAwarder> {
        self.awarder.clone()
    }

    /// The module's public API.
    #[must_use]
    pub fn client(&self) -> Arc<dyn ProfilesApi> {
        Arc::new(LocalProfilesClient::new(
            self.users.clone(),
            self.profiles.clone(),
            self.badges.clone(),
        ))
    }
}
