//! Tracing subscriber setup.

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Calling this again after a subscriber is installed is a no-op.
///
/// # Errors
/// Fails when the configured level is not a valid filter directive.
pub fn init_tracing(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.level)
            .with_context(|| format!("invalid log level '{}'", cfg.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if cfg.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let cfg = LoggingConfig {
            level: "profiles=[".to_owned(),
            json: false,
        };
        assert!(init_tracing(&cfg).is_err());
    }
}
