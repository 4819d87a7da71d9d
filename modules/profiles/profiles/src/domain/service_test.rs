#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use profiles_sdk::{BadgePatch, NewBadge, NewProfile, NewUser, ProfilePatch, UserPatch};
use storekit::inmem::{MemoryBlobStore, MemoryDirectory, MemoryTableClient};
use storekit::{ErrorKind, ListOptions, QueryConfig};
use tracing_test::traced_test;
use uuid::Uuid;

use crate::config::ProfilesConfig;
use crate::domain::events::ProfileDomainEvent;
use crate::domain::ports::NoopPublisher;
use crate::domain::service::GrantOutcome;
use crate::infra::storage::UNIQUE_CONSTRAINTS;
use crate::module::{Backends, ProfilesModule};

fn tables() -> Arc<MemoryTableClient> {
    Arc::new(
        UNIQUE_CONSTRAINTS
            .iter()
            .fold(MemoryTableClient::new(), |c, (t, cols)| c.with_unique(t, cols)),
    )
}

fn module_over(tables: Arc<MemoryTableClient>) -> ProfilesModule {
    module_with(ProfilesConfig::default(), tables)
}

fn module_with(config: ProfilesConfig, tables: Arc<MemoryTableClient>) -> ProfilesModule {
    let backends = Backends {
        tables,
        directory: Arc::new(MemoryDirectory::new()),
        blobs: Arc::new(MemoryBlobStore::new("http://files.local")),
    };
    ProfilesModule::build(config, &backends, Arc::new(NoopPublisher))
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_owned(),
        password: "Sup3r$ecret".to_owned(),
        display_name: Some("Tester".to_owned()),
        phone: None,
    }
}

fn new_profile(user_id: Uuid, username: &str) -> NewProfile {
    NewProfile {
        user_id,
        username: username.to_owned(),
        full_name: Some("Full Name".to_owned()),
        bio: None,
        location: Some("Lisbon".to_owned()),
        locale: None,
    }
}

#[tokio::test]
async fn user_emails_are_unique() {
    let module = module_over(tables());
    let users = module.users();
    let first = users.create_user(new_user("dup@example.com")).await.unwrap();
    assert_eq!(first.display_name.as_deref(), Some("Tester"));

    let err = users
        .create_user(new_user("dup@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let other = users.create_user(new_user("other@example.com")).await.unwrap();
    let err = users
        .update_user(
            other.id,
            UserPatch {
                email: Some("dup@example.com".to_owned()),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn invalid_user_is_rejected_before_storage() {
    let module = module_over(tables());
    let mut user = new_user("not-an-email");
    user.password = "short".to_owned();
    let err = module.users().create_user(user).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let page = module.users().list_users(ListOptions::default()).await.unwrap();
    assert_eq!(page.page_info.total, 0);
}

#[tokio::test]
async fn blank_patch_fields_keep_stored_values() {
    let module = module_over(tables());
    let user = module.users().create_user(new_user("p@example.com")).await.unwrap();
    let profile = module
        .profiles()
        .create_profile(new_profile(user.id, "patchy"))
        .await
        .unwrap();

    let updated = module
        .profiles()
        .update_profile(
            profile.id,
            ProfilePatch {
                username: Some("   ".to_owned()),
                bio: Some("Hello".to_owned()),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, "patchy");
    assert_eq!(updated.bio.as_deref(), Some("Hello"));
    assert_eq!(updated.location.as_deref(), Some("Lisbon"));
    assert_eq!(updated.created_at, profile.created_at);
}

#[tokio::test]
async fn renaming_onto_a_taken_username_conflicts() {
    let module = module_over(tables());
    let profiles = module.profiles();
    let a = module.users().create_user(new_user("a@example.com")).await.unwrap();
    let b = module.users().create_user(new_user("b@example.com")).await.unwrap();
    profiles.create_profile(new_profile(a.id, "alpha")).await.unwrap();
    let pb = profiles.create_profile(new_profile(b.id, "bravo")).await.unwrap();

    let err = profiles
        .update_profile(
            pb.id,
            ProfilePatch {
                username: Some("alpha".to_owned()),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn seeding_skips_existing_names() {
    let module = module_over(tables());
    let first = module.seed_rule_badges().await.unwrap();
    assert_eq!(first.len(), 2);
    let again = module.seed_rule_badges().await.unwrap();
    assert!(again.is_empty());

    let created = module
        .badges()
        .seed_badges(vec![
            NewBadge::named("explorer"),
            NewBadge::named("helper"),
            NewBadge::named("helper"),
        ])
        .await
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "helper");
}

#[tokio::test]
async fn invalid_seed_names_the_element() {
    let module = module_over(tables());
    let err = module
        .badges()
        .seed_badges(vec![NewBadge::named("ok-badge"), NewBadge::named("x")])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("[1].name"));
}

#[tokio::test]
async fn badge_rename_checks_uniqueness() {
    let module = module_over(tables());
    let badges = module.badges();
    badges.create_badge(NewBadge::named("first")).await.unwrap();
    let second = badges.create_badge(NewBadge::named("second")).await.unwrap();

    let err = badges
        .update_badge(
            second.id,
            BadgePatch {
                name: Some("first".to_owned()),
                ..BadgePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let renamed = badges
        .update_badge(
            second.id,
            BadgePatch {
                name: Some("runner-up".to_owned()),
                description: Some("Came second".to_owned()),
                ..BadgePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "runner-up");
    assert_eq!(renamed.description.as_deref(), Some("Came second"));
}

#[tokio::test]
#[traced_test]
async fn awarder_skips_badges_missing_from_catalogue() {
    let module = module_over(tables());
    let user = module.users().create_user(new_user("s@example.com")).await.unwrap();

    let outcomes = module
        .awarder()
        .handle(&ProfileDomainEvent::ProfileCreated {
            user_id: user.id,
            profile_id: Uuid::new_v4(),
            at: chrono::Utc::now(),
        })
        .await;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], GrantOutcome::Skipped { badge, .. } if badge == "explorer"));
    assert!(logs_contain("badge rule skipped"));
}

#[tokio::test]
async fn awarder_reports_already_held() {
    let module = module_over(tables());
    module.seed_rule_badges().await.unwrap();
    let user = module.users().create_user(new_user("h@example.com")).await.unwrap();
    let event = ProfileDomainEvent::ProfileCreated {
        user_id: user.id,
        profile_id: Uuid::new_v4(),
        at: chrono::Utc::now(),
    };

    let first = module.awarder().handle(&event).await;
    assert!(first[0].is_granted());
    let second = module.awarder().handle(&event).await;
    assert_eq!(
        second,
        vec![GrantOutcome::AlreadyHeld {
            badge: "explorer".to_owned()
        }]
    );
}

#[tokio::test]
#[traced_test]
async fn storage_outage_surfaces_as_unavailable() {
    let tables = tables();
    let module = module_over(tables.clone());
    let user = module.users().create_user(new_user("o@example.com")).await.unwrap();
    tables.set_available(false);

    let err = module
        .profiles()
        .create_profile(new_profile(user.id, "offline"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);

    let public = profiles_sdk::ProfilesError::from(err);
    assert_eq!(public.kind(), ErrorKind::Backend);
    assert!(logs_contain("storage unavailable"));
}

#[tokio::test]
async fn configured_page_limits_apply_to_every_listing() {
    let config = ProfilesConfig {
        query: QueryConfig {
            default_per_page: 2,
            max_per_page: 5,
            ..QueryConfig::default()
        },
        ..ProfilesConfig::default()
    };
    let module = module_with(config, tables());
    for i in 0..8 {
        let user = module
            .users()
            .create_user(new_user(&format!("limit{i}@example.com")))
            .await
            .unwrap();
        module
            .profiles()
            .create_profile(new_profile(user.id, &format!("limit{i}")))
            .await
            .unwrap();
    }

    let page = module
        .profiles()
        .list_profiles(ListOptions::default().with_per_page(50))
        .await
        .unwrap();
    assert_eq!(page.page_info.per_page, 5);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.page_info.total, 8);

    let page = module
        .profiles()
        .list_profiles(ListOptions::default())
        .await
        .unwrap();
    assert_eq!(page.page_info.per_page, 2);
    assert_eq!(page.items.len(), 2);

    let page = module
        .users()
        .search_users(ListOptions::default().with_search("limit").with_per_page(50))
        .await
        .unwrap();
    assert_eq!(page.page_info.per_page, 5);
    assert_eq!(page.page_info.total, 8);
}
