//! Runtime configuration read from the environment.
//!
//! Reads:
//! - PANELIST_HOME (optional, default: ".panelist")
//! - PANELIST_USER / PANELIST_PASSWORD_SHA256 (optional credential override)
//! - PANELIST_EVALUATOR (optional display name)
//!
//! Database selection lives with the backend; see
//! `panelist_state::SurrealHandle::setup_from_env`.

use std::path::PathBuf;

use crate::auth::Credentials;

const DEFAULT_HOME: &str = ".panelist";

#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Directory for the device token, session flag and local database.
    pub home: PathBuf,
    pub credentials: Credentials,
    /// Overrides the device token as evaluator id when set.
    pub evaluator_name: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DEFAULT_HOME),
            credentials: Credentials::demo(),
            evaluator_name: None,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Self {
        let home = std::env::var("PANELIST_HOME")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME));
        let evaluator_name = std::env::var("PANELIST_EVALUATOR")
            .ok()
            .filter(|n| !n.trim().is_empty());

        Self {
            home,
            credentials: Credentials::from_env(),
            evaluator_name,
        }
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_evaluator(mut self, name: impl Into<String>) -> Self {
        self.evaluator_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_override_defaults() {
        let config = PanelConfig::default()
            .with_home("/tmp/panel")
            .with_evaluator("Dr. Seo");
        assert_eq!(config.home, PathBuf::from("/tmp/panel"));
        assert_eq!(config.evaluator_name.as_deref(), Some("Dr. Seo"));
        assert_eq!(config.credentials, Credentials::demo());
    }
}
