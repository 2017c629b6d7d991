use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::auth::{Identity, Profile};

use super::KeyValueStore;

/// Storage key holding the bearer credential
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the JSON-serialized profile
pub const USER_KEY: &str = "user";

/// What the persisted record looked like when it was read.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredSession {
    Empty,
    Valid(Identity),
    /// Half a record, or a record that does not parse.
    Corrupt(String),
}

/// The persisted half of a session: the credential and profile, written
/// together and removed together.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Read the persisted record and classify it.
    pub fn load(&self) -> Result<StoredSession> {
        let token = self.backend.get(TOKEN_KEY).context("Failed to read stored token")?;
        let user = self.backend.get(USER_KEY).context("Failed to read stored user")?;

        let stored = match (token, user) {
            (None, None) => StoredSession::Empty,
            (Some(_), None) => StoredSession::Corrupt("token present without user".to_string()),
            (None, Some(_)) => StoredSession::Corrupt("user present without token".to_string()),
            (Some(token), Some(_)) if token.trim().is_empty() => {
                StoredSession::Corrupt("empty token".to_string())
            }
            (Some(token), Some(user)) => match serde_json::from_str::<Profile>(&user) {
                Ok(profile) if profile.is_well_formed() => StoredSession::Valid(Identity {
                    credential: token,
                    profile,
                }),
                Ok(_) => StoredSession::Corrupt("user has no name or email".to_string()),
                Err(e) => StoredSession::Corrupt(format!("user does not parse: {}", e)),
            },
        };
        Ok(stored)
    }

    /// Persist both halves of the record. A failed second write leaves no
    /// record at all rather than a new token beside an old user.
    pub fn save(&self, identity: &Identity) -> Result<()> {
        let user = serde_json::to_string(&identity.profile).context("Failed to serialize user")?;

        self.backend
            .set(TOKEN_KEY, &identity.credential)
            .context("Failed to store token")?;

        if let Err(e) = self.backend.set(USER_KEY, &user) {
            if let Err(rollback) = self.clear() {
                warn!(error = %rollback, "Failed to roll back session record after user write failed");
            }
            return Err(e).context("Failed to store user");
        }

        debug!("Session record saved");
        Ok(())
    }

    /// Replace only the profile half, keeping the current credential.
    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let user = serde_json::to_string(profile).context("Failed to serialize user")?;
        self.backend.set(USER_KEY, &user).context("Failed to store user")
    }

    /// Remove both entries. Both removals are attempted even if one fails.
    pub fn clear(&self) -> Result<()> {
        let token = self.backend.remove(TOKEN_KEY);
        let user = self.backend.remove(USER_KEY);
        token.context("Failed to remove stored token")?;
        user.context("Failed to remove stored user")?;
        debug!("Session record cleared");
        Ok(())
    }

    /// The stored credential, if any. Read failures count as no credential.
    pub fn credential(&self) -> Option<String> {
        match self.backend.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.load(), Ok(StoredSession::Empty))
    }
}
