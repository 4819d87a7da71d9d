#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::sync::Arc;

use profiles::domain::events::ProfileDomainEvent;
use profiles::domain::ports::EventLog;
use profiles::{Backends, ProfilesConfig, ProfilesModule};
use profiles_sdk::{NewProfile, NewUser, ProfilesApi, User};
use uuid::Uuid;

pub struct Harness {
    pub module: ProfilesModule,
    pub api: Arc<dyn ProfilesApi>,
    pub events: Arc<EventLog<ProfileDomainEvent>>,
    pub backends: Backends,
}

/// Module over in-memory backends with the rule badges seeded.
pub async fn harness() -> Harness {
    let config = ProfilesConfig::default();
    let backends = Backends::in_memory(&config.storage.public_base_url);
    let events = Arc::new(EventLog::new());
    let module = ProfilesModule::build(config, &backends, events.clone());
    module
        .seed_rule_badges()
        .await
        .expect("Failed to seed rule badges");
    let api = module.client();
    Harness {
        module,
        api,
        events,
        backends,
    }
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_owned(),
        password: "Sup3r$ecret".to_owned(),
        display_name: None,
        phone: None,
    }
}

pub fn new_profile(user_id: Uuid, username: &str) -> NewProfile {
    NewProfile {
        user_id,
        username: username.to_owned(),
        full_name: None,
        bio: None,
        location: None,
        locale: None,
    }
}

pub async fn seed_user(api: &dyn ProfilesApi, email: &str) -> User {
    api.create_user(new_user(email))
        .await
        .expect("Failed to seed user")
}
