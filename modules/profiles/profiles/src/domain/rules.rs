//! Event to badge rule table.

use crate::config::BadgeRulesConfig;
use crate::domain::events::EventKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRule {
    pub on: EventKind,
    pub badge: String,
}

/// Which badge each domain event awards. An event may award several badges;
/// rules run in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeRules {
    rules: Vec<BadgeRule>,
}

impl BadgeRules {
    #[must_use]
    pub fn new(rules: Vec<BadgeRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn from_config(cfg: &BadgeRulesConfig) -> Self {
        Self::new(vec![
            BadgeRule {
                on: EventKind::ProfileCreated,
                badge: cfg.explorer.clone(),
            },
            BadgeRule {
                on: EventKind::IdentityVerified,
                badge: cfg.verified_locale.clone(),
            },
        ])
    }

    pub fn for_event(&self, kind: EventKind) -> impl Iterator<Item = &BadgeRule> {
        self.rules.iter().filter(move |r| r.on == kind)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
