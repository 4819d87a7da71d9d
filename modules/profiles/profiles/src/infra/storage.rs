//! Table layouts and directory mapping of the profiles module.

use profiles_sdk::User;
use storekit::backend::{DirectoryUser, UserAttributes};
use storekit::{DirectoryMapping, Embed, TableSpec};

use crate::domain::records::UserRecord;

pub static PROFILES: TableSpec = TableSpec {
    table: "profiles",
    entity: "profile",
    columns: &[
        "user_id",
        "username",
        "full_name",
        "bio",
        "location",
        "locale",
        "avatar_url",
        "is_verified",
        "verified_at",
    ],
    searchable: &["username", "full_name", "bio", "location"],
    embeds: &[],
};

pub static BADGES: TableSpec = TableSpec {
    table: "badges",
    entity: "badge",
    columns: &["name", "description", "icon_url"],
    searchable: &["name", "description"],
    embeds: &[],
};

pub static USER_BADGES: TableSpec = TableSpec {
    table: "user_badges",
    entity: "user_badge",
    columns: &["user_id", "badge_id", "awarded_at"],
    searchable: &[],
    embeds: &[Embed {
        field: "badge",
        table: "badges",
        foreign_key: "badge_id",
    }],
};

/// Unique constraints the table store must enforce, as `(table, columns)`.
pub const UNIQUE_CONSTRAINTS: &[(&str, &[&str])] = &[
    ("profiles", &["user_id"]),
    ("profiles", &["username"]),
    ("badges", &["name"]),
    ("user_badges", &["user_id", "badge_id"]),
];

const DISPLAY_NAME_KEY: &str = "display_name";

/// Directory accounts as [`User`]s. The display name lives in user metadata.
pub struct UserMapping;

impl DirectoryMapping for UserMapping {
    type Write = UserRecord;
    type Read = User;

    const ENTITY: &'static str = "user";

    fn attributes(input: UserRecord) -> UserAttributes {
        let user_metadata = input.display_name.map(|name| {
            let mut metadata = serde_json::Map::new();
            metadata.insert(DISPLAY_NAME_KEY.to_owned(), name.into());
            metadata
        });
        UserAttributes {
            email: input.email,
            password: input.password,
            phone: input.phone,
            email_confirm: None,
            user_metadata,
        }
    }

    fn read(user: DirectoryUser) -> User {
        let display_name = user
            .user_metadata
            .get(DISPLAY_NAME_KEY)
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        User {
            id: user.id,
            email: user.email,
            display_name,
            phone: user.phone,
            email_confirmed: user.email_confirmed_at.is_some(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn display_name_round_trips_through_metadata() {
        let attrs = UserMapping::attributes(UserRecord {
            email: Some("ada@example.com".to_owned()),
            password: Some("Engine#1843".to_owned()),
            display_name: Some("Ada".to_owned()),
            phone: None,
        });
        let metadata = attrs.user_metadata.unwrap();

        let now = Utc::now();
        let user = UserMapping::read(DirectoryUser {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            phone: None,
            email_confirmed_at: Some(now),
            user_metadata: metadata,
            created_at: now,
            updated_at: now,
            last_sign_in_at: None,
        });
        assert_eq!(user.display_name.as_deref(), Some("Ada"));
        assert!(user.email_confirmed);
    }

    #[test]
    fn absent_display_name_leaves_metadata_alone() {
        let attrs = UserMapping::attributes(UserRecord {
            phone: Some("+100".to_owned()),
            ..UserRecord::default()
        });
        assert!(attrs.user_metadata.is_none());
        assert!(attrs.email.is_none());
    }

    #[test]
    fn every_table_allows_generated_columns() {
        for table in [&PROFILES, &BADGES, &USER_BADGES] {
            assert!(table.allows("id"));
            assert!(table.allows("created_at"));
            assert!(!table.allows("password"));
        }
    }
}
