//! Twitter session cookies
//!
//! A session is the `auth_token` / `ct0` cookie pair of a logged-in
//! browser. It is looked up in the saved cookies file first, then in
//! `TWITTER_AUTH_TOKEN` / `TWITTER_CT0`; cookies found in the environment
//! are written back to the file so later runs work without them.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PlatformError, Result};

pub const MISSING_COOKIES: &str =
    "No Twitter cookies found. Set TWITTER_AUTH_TOKEN and TWITTER_CT0 in .env";

/// On-disk form of the cookies file.
#[derive(Serialize, Deserialize)]
struct CookieJar {
    auth_token: String,
    ct0: String,
}

pub struct Session {
    auth_token: SecretString,
    ct0: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("auth_token", &"[REDACTED]")
            .field("ct0", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    pub fn new(auth_token: impl Into<String>, ct0: impl Into<String>) -> Self {
        Self {
            auth_token: SecretString::from(auth_token.into()),
            ct0: SecretString::from(ct0.into()),
        }
    }

    pub fn auth_token(&self) -> &str {
        self.auth_token.expose_secret()
    }

    pub fn ct0(&self) -> &str {
        self.ct0.expose_secret()
    }

    /// Find a session, saving environment cookies to `cookies_path`.
    ///
    /// Fails with an authentication error when neither source has cookies.
    pub fn resolve(cookies_path: &Path) -> Result<Self> {
        if let Some(session) = Self::from_cookies_file(cookies_path) {
            tracing::debug!("Using saved cookies from {}", cookies_path.display());
            return Ok(session);
        }

        let session = Self::from_env()
            .ok_or_else(|| PlatformError::Authentication(MISSING_COOKIES.to_string()))?;

        if let Err(e) = session.save(cookies_path) {
            tracing::warn!("Could not save cookies to {}: {}", cookies_path.display(), e);
        }
        Ok(session)
    }

    /// Read the cookies file. Missing, unreadable, or incomplete files are
    /// treated as absent.
    pub fn from_cookies_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let jar: CookieJar = match serde_json::from_str(&content) {
            Ok(jar) => jar,
            Err(e) => {
                tracing::warn!("Ignoring malformed cookies file {}: {}", path.display(), e);
                return None;
            }
        };
        if jar.auth_token.is_empty() || jar.ct0.is_empty() {
            return None;
        }
        Some(Self::new(jar.auth_token, jar.ct0))
    }

    pub fn from_env() -> Option<Self> {
        let auth_token = std::env::var("TWITTER_AUTH_TOKEN").ok().filter(|v| !v.is_empty())?;
        let ct0 = std::env::var("TWITTER_CT0").ok().filter(|v| !v.is_empty())?;
        Some(Self::new(auth_token, ct0))
    }

    /// Write the cookies file, readable by the owner only.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let jar = CookieJar {
            auth_token: self.auth_token().to_string(),
            ct0: self.ct0().to_string(),
        };
        let content = serde_json::to_string(&jar)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}
