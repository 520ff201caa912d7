//! Evaluator identity.
//!
//! Each device keeps a durable token (`interviewer_<millis>_<9 chars>`) in
//! `<home>/interviewer_id`. A non-blank display name overrides the token as
//! the evaluator id written on evaluations.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::Result;

const TOKEN_FILE: &str = "interviewer_id";

/// Generate a fresh device token.
pub fn generate_device_token() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("interviewer_{}_{}", Utc::now().timestamp_millis(), &random[..9])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorIdentity {
    device_token: String,
    display_name: Option<String>,
}

impl EvaluatorIdentity {
    pub fn new(device_token: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            display_name: None,
        }
    }

    /// Read the device token under `home`, creating and storing one if absent.
    pub fn load_or_create(home: &Path) -> Result<Self> {
        let path = token_path(home);
        if let Ok(existing) = std::fs::read_to_string(&path) {
            let token = existing.trim();
            if !token.is_empty() {
                debug!(path = %path.display(), "Loaded device token");
                return Ok(Self::new(token));
            }
        }

        std::fs::create_dir_all(home)?;
        let token = generate_device_token();
        std::fs::write(&path, &token)?;
        info!(path = %path.display(), "Created device token");
        Ok(Self::new(token))
    }

    /// Override the token with a display name. Blank names are ignored.
    pub fn with_display_name(mut self, name: Option<&str>) -> Self {
        self.display_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self
    }

    pub fn device_token(&self) -> &str {
        &self.device_token
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// The id evaluations are keyed by.
    pub fn evaluator_id(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.device_token)
    }
}

fn token_path(home: &Path) -> PathBuf {
    home.join(TOKEN_FILE)
}
