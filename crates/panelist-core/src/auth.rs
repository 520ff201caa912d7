//! Static credential gate.
//!
//! One configured user; the password is compared by SHA-256 digest. A
//! successful login writes `<home>/session.json`, which board commands
//! require. Logout removes it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::{PanelError, Result, ValidationError};

const SESSION_FILE: &str = "session.json";
const DEMO_USER: &str = "kgukah";
const DEMO_PASSWORD: &str = "kah2026";

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// The accepted user and password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password_sha256: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self::demo()
    }
}

impl Credentials {
    /// Built-in demo account.
    pub fn demo() -> Self {
        Self {
            user: DEMO_USER.to_string(),
            password_sha256: sha256_hex(DEMO_PASSWORD),
        }
    }

    /// `PANELIST_USER` and `PANELIST_PASSWORD_SHA256` when both are set,
    /// otherwise the demo account.
    pub fn from_env() -> Self {
        match (
            std::env::var("PANELIST_USER"),
            std::env::var("PANELIST_PASSWORD_SHA256"),
        ) {
            (Ok(user), Ok(digest)) if !user.trim().is_empty() && !digest.trim().is_empty() => {
                Self {
                    user: user.trim().to_string(),
                    password_sha256: digest.trim().to_lowercase(),
                }
            }
            _ => Self::demo(),
        }
    }

    /// Check a login attempt. The user is trimmed, the password is not.
    pub fn verify(&self, user: &str, password: &str) -> Result<()> {
        if user.trim().is_empty() || password.trim().is_empty() {
            return Err(ValidationError::BlankCredentials.into());
        }
        if user.trim() != self.user || sha256_hex(password) != self.password_sha256 {
            return Err(PanelError::InvalidCredentials);
        }
        Ok(())
    }
}

/// Contents of the session flag file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSession {
    pub user: String,
    pub logged_in_at: DateTime<Utc>,
}

fn session_path(home: &Path) -> PathBuf {
    home.join(SESSION_FILE)
}

/// Verify the attempt and write the session flag.
pub fn login(
    home: &Path,
    credentials: &Credentials,
    user: &str,
    password: &str,
) -> Result<LoginSession> {
    if let Err(err) = credentials.verify(user, password) {
        warn!(user = %user.trim(), error = %err, "Login rejected");
        return Err(err);
    }

    let session = LoginSession {
        user: user.trim().to_string(),
        logged_in_at: Utc::now(),
    };
    std::fs::create_dir_all(home)?;
    std::fs::write(session_path(home), serde_json::to_vec_pretty(&session)?)?;
    info!(user = %session.user, "Logged in");
    Ok(session)
}

/// Remove the session flag. Returns whether one existed.
pub fn logout(home: &Path) -> Result<bool> {
    match std::fs::remove_file(session_path(home)) {
        Ok(()) => {
            info!("Logged out");
            Ok(true)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// The current session, or `Unauthorized`.
pub fn require_session(home: &Path) -> Result<LoginSession> {
    let path = session_path(home);
    let bytes = std::fs::read(&path)
        .map_err(|_| PanelError::Unauthorized("run `panelist login` first".to_string()))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| PanelError::Unauthorized("session file is corrupt, log in again".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_distinguishes_blank_from_wrong() {
        let creds = Credentials::demo();
        assert!(creds.verify(" kgukah ", "kah2026").is_ok());
        assert!(matches!(
            creds.verify("", "kah2026"),
            Err(PanelError::Validation(ValidationError::BlankCredentials))
        ));
        assert!(matches!(
            creds.verify("kgukah", "wrong"),
            Err(PanelError::InvalidCredentials)
        ));
        assert!(matches!(
            creds.verify("kgukah", " kah2026"),
            Err(PanelError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_login_logout_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path();

        assert!(matches!(
            require_session(home),
            Err(PanelError::Unauthorized(_))
        ));

        let session = login(home, &Credentials::demo(), "kgukah", "kah2026").unwrap();
        assert_eq!(require_session(home).unwrap(), session);

        assert!(logout(home).unwrap());
        assert!(!logout(home).unwrap());
        assert!(require_session(home).is_err());
    }

    #[test]
    fn test_failed_login_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(login(dir.path(), &Credentials::demo(), "kgukah", "nope").is_err());
        assert!(require_session(dir.path()).is_err());
    }
}
