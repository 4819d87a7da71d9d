use std::sync::Arc;

use storekit::ErrorKind;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::BadgesService;
use crate::domain::events::ProfileDomainEvent;
use crate::domain::rules::BadgeRules;

/// Result of one rule applied to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted { badge: String, grant_id: Uuid },
    AlreadyHeld { badge: String },
    /// The badge is not in the catalogue.
    Skipped { badge: String, reason: String },
    Failed { badge: String, message: String },
}

impl GrantOutcome {
    #[must_use]
    pub fn badge(&self) -> &str {
        match self {
            Self::Granted { badge, .. }
            | Self::AlreadyHeld { badge }
            | Self::Skipped { badge, .. }
            | Self::Failed { badge, .. } => badge,
        }
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Applies the badge rule table to domain events.
///
/// Awarding is best effort: the workflow that raised the event has already
/// committed, so every failure ends up in the returned outcomes and the log.
pub struct BadgeAwarder {
    badges: Arc<BadgesService>,
    rules: BadgeRules,
}

impl BadgeAwarder {
    #[must_use]
    pub fn new(badges: Arc<BadgesService>, rules: BadgeRules) -> Self {
        Self { badges, rules }
    }

    #[instrument(skip_all, fields(user_id = %event.user_id(), event = event.kind().as_str()))]
    pub async fn handle(&self, event: &ProfileDomainEvent) -> Vec<GrantOutcome> {
        let user_id = event.user_id();
        let mut outcomes = Vec::new();
        for rule in self.rules.for_event(event.kind()) {
            let outcome = self.award(user_id, &rule.badge).await;
            match &outcome {
                GrantOutcome::Granted { badge, grant_id } => {
                    info!(%badge, %grant_id, "badge awarded");
                }
                GrantOutcome::AlreadyHeld { .. } => {}
                GrantOutcome::Skipped { badge, reason } => {
                    warn!(%badge, %reason, "badge rule skipped");
                }
                GrantOutcome::Failed { badge, message } => {
                    warn!(%badge, %message, "badge award failed");
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn award(&self, user_id: Uuid, name: &str) -> GrantOutcome {
        let badge = name.to_owned();
        let found = match self.badges.get_badge_by_name(name).await {
            Ok(found) => found,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return GrantOutcome::Skipped {
                    badge,
                    reason: "badge is not in the catalogue".to_owned(),
                };
            }
            Err(e) => {
                return GrantOutcome::Failed {
                    badge,
                    message: e.to_string(),
                };
            }
        };
        match self.badges.grant_badge(user_id, found.id).await {
            Ok(grant) => GrantOutcome::Granted {
                badge,
                grant_id: grant.id,
            },
            Err(e) if e.kind() == ErrorKind::Conflict => GrantOutcome::AlreadyHeld { badge },
            Err(e) => GrantOutcome::Failed {
                badge,
                message: e.to_string(),
            },
        }
    }
}
