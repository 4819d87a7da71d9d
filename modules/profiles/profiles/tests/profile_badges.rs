#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end badge awarding through the public API.
//!
//! These tests verify:
//! - profile creation awards the explorer badge exactly once
//! - a user cannot hold the same badge twice
//! - identity verification awards the locale badge
//! - deleting a badge revokes its grants

mod support;

use bytes::Bytes;
use profiles::domain::events::EventKind;
use profiles_sdk::{
    AvatarUpload, ErrorKind, FilterOption, IdentityDocument, ListOptions, NewBadge,
};
use support::{harness, new_profile, seed_user};
use uuid::Uuid;

fn pdf() -> IdentityDocument {
    IdentityDocument {
        document_type: "passport".to_owned(),
        locale: Some("fr-FR".to_owned()),
        file_name: "passport.pdf".to_owned(),
        content_type: "application/pdf".to_owned(),
        bytes: Bytes::from_static(b"%PDF-1.7"),
    }
}

#[tokio::test]
async fn profile_for_unknown_user_is_not_found() {
    let h = harness().await;
    let err = h
        .api
        .create_profile(new_profile(Uuid::new_v4(), "ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(h.events.snapshot().is_empty());
}

#[tokio::test]
async fn first_profile_awards_explorer_once() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "ada@example.com").await;

    let profile = h.api.create_profile(new_profile(user.id, "ada")).await.unwrap();
    assert_eq!(profile.user_id, user.id);
    assert!(!profile.is_verified);

    let held = h.api.list_user_badges(user.id).await.unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].badge.as_ref().unwrap().name, "explorer");

    let err = h
        .api
        .create_profile(new_profile(user.id, "ada2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.api.list_user_badges(user.id).await.unwrap().len(), 1);

    let events = h.events.snapshot();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::ProfileCreated);
}

#[tokio::test]
async fn usernames_are_unique() {
    let h = harness().await;
    let a = seed_user(h.api.as_ref(), "a@example.com").await;
    let b = seed_user(h.api.as_ref(), "b@example.com").await;
    h.api.create_profile(new_profile(a.id, "taken")).await.unwrap();

    let err = h
        .api
        .create_profile(new_profile(b.id, "taken"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn double_grant_is_a_conflict() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "grace@example.com").await;
    let badge = h
        .api
        .create_badge(NewBadge::named("mentor").with_description("Helped others"))
        .await
        .unwrap();

    let grant = h.api.grant_badge(user.id, badge.id).await.unwrap();
    assert_eq!(grant.badge.as_ref().map(|b| b.id), Some(badge.id));
    assert!(h.api.has_badge(user.id, badge.id).await.unwrap());

    let err = h.api.grant_badge(user.id, badge.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = h
        .api
        .grant_badge_by_name(user.id, "mentor")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.api.list_user_badges(user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn grant_requires_existing_user_and_badge() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "x@example.com").await;
    let badge = h.api.get_badge_by_name("explorer").await.unwrap();

    let err = h.api.grant_badge(Uuid::new_v4(), badge.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h.api.grant_badge(user.id, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = h
        .api
        .grant_badge_by_name(user.id, "nonexistent")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn verification_awards_locale_badge() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "marie@example.com").await;
    h.api.create_profile(new_profile(user.id, "marie")).await.unwrap();

    let profile = h.api.verify_identity(user.id, pdf()).await.unwrap();
    assert!(profile.is_verified);
    assert!(profile.verified_at.is_some());
    assert_eq!(profile.locale.as_deref(), Some("fr-FR"));

    let verified = h.api.get_badge_by_name("verified-locale").await.unwrap();
    assert!(h.api.has_badge(user.id, verified.id).await.unwrap());
    assert_eq!(h.api.list_user_badges(user.id).await.unwrap().len(), 2);

    let err = h.api.verify_identity(user.id, pdf()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let kinds: Vec<_> = h.events.snapshot().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::ProfileCreated, EventKind::IdentityVerified]);
}

#[tokio::test]
async fn verification_rejects_unaccepted_documents() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "doc@example.com").await;
    h.api.create_profile(new_profile(user.id, "doc")).await.unwrap();

    let mut document = pdf();
    document.content_type = "text/plain".to_owned();
    let err = h.api.verify_identity(user.id, document).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let profile = h.api.get_profile_by_user(user.id).await.unwrap();
    assert!(!profile.is_verified);
}

#[tokio::test]
async fn avatar_upload_sets_public_url() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "pic@example.com").await;
    h.api.create_profile(new_profile(user.id, "pic")).await.unwrap();

    let profile = h
        .api
        .upload_avatar(
            user.id,
            AvatarUpload {
                file_name: "me.jpeg".to_owned(),
                content_type: "image/jpeg".to_owned(),
                bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF]),
            },
        )
        .await
        .unwrap();
    let url = profile.avatar_url.unwrap();
    assert!(url.starts_with("http://localhost:54321/storage/v1/object/public/avatars/"));
    assert!(url.contains(&user.id.to_string()));
    assert!(url.ends_with(".jpg"));
}

#[tokio::test]
async fn avatar_without_profile_is_not_found() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "np@example.com").await;
    let err = h
        .api
        .upload_avatar(
            user.id,
            AvatarUpload {
                file_name: "me.png".to_owned(),
                content_type: "image/png".to_owned(),
                bytes: Bytes::from_static(b"png"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn deleting_a_badge_revokes_its_grants() {
    let h = harness().await;
    let user = seed_user(h.api.as_ref(), "rm@example.com").await;
    h.api.create_profile(new_profile(user.id, "rmv")).await.unwrap();
    let explorer = h.api.get_badge_by_name("explorer").await.unwrap();

    h.api.delete_badge(explorer.id).await.unwrap();
    assert!(h.api.list_user_badges(user.id).await.unwrap().is_empty());
    let err = h.api.get_badge(explorer.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn missing_rule_badge_does_not_fail_profile_creation() {
    let h = harness().await;
    let explorer = h.api.get_badge_by_name("explorer").await.unwrap();
    h.api.delete_badge(explorer.id).await.unwrap();

    let user = seed_user(h.api.as_ref(), "late@example.com").await;
    h.api.create_profile(new_profile(user.id, "late")).await.unwrap();
    assert!(h.api.list_user_badges(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_total_matches_count() {
    let h = harness().await;
    for (email, username) in [
        ("r1@example.com", "rustacean"),
        ("r2@example.com", "crustacean"),
        ("g1@example.com", "gopher"),
    ] {
        let user = seed_user(h.api.as_ref(), email).await;
        h.api.create_profile(new_profile(user.id, username)).await.unwrap();
    }

    let page = h
        .api
        .search_profiles(ListOptions::default().with_search("ACEAN").with_per_page(1))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.page_info.total, 2);

    let page = h
        .api
        .list_profiles(
            ListOptions::default().with_filter(FilterOption::like("username", "OPHE")),
        )
        .await
        .unwrap();
    assert_eq!(page.page_info.total, 1);
    assert_eq!(page.items[0].username, "gopher");
}

#[tokio::test]
async fn directory_like_filter_matches_substrings() {
    let h = harness().await;
    for email in ["a@x.com", "ab@x.com", "zz@y.com"] {
        seed_user(h.api.as_ref(), email).await;
    }

    let page = h
        .api
        .list_users(ListOptions::default().with_filter(FilterOption::like("email", "a")))
        .await
        .unwrap();
    let mut emails: Vec<_> = page.items.iter().map(|u| u.email.as_str()).collect();
    emails.sort_unstable();
    assert_eq!(emails, vec!["a@x.com", "ab@x.com"]);
    assert_eq!(page.page_info.total, 2);
}
