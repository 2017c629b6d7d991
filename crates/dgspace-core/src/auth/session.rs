use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shown when a profile carries no usable name or email.
const FALLBACK_DISPLAY_NAME: &str = "User";

/// User identity returned by the backend at login.
///
/// Unknown fields are kept so a profile read back from storage is identical
/// to the one that was written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Profile {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// A profile must identify someone: a name, a full name or an email.
    pub fn is_well_formed(&self) -> bool {
        non_empty(&self.name).is_some()
            || non_empty(&self.full_name).is_some()
            || non_empty(&self.email).is_some()
    }

    pub fn display_name(&self) -> &str {
        non_empty(&self.name)
            .or_else(|| non_empty(&self.full_name))
            .or_else(|| non_empty(&self.email))
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}

/// Credential and profile of a signed-in user. They only ever exist together.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub credential: String,
    pub profile: Profile,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Persisted record not yet read. Entered once at startup, never again.
    Initializing,
    Authenticated,
    Unauthenticated,
}

/// In-memory authentication state of the client process.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    resolved: bool,
    identity: Option<Identity>,
}

impl Session {
    pub fn initializing() -> Self {
        Self {
            resolved: false,
            identity: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            resolved: true,
            identity: None,
        }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            resolved: true,
            identity: Some(identity),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn status(&self) -> AuthStatus {
        match (self.resolved, &self.identity) {
            (_, Some(_)) => AuthStatus::Authenticated,
            (false, None) => AuthStatus::Initializing,
            (true, None) => AuthStatus::Unauthenticated,
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.credential.as_str())
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.identity.as_ref().map(|i| &i.profile)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub(crate) fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            credential: "abc".to_string(),
            profile: Profile::named("A"),
        }
    }

    #[test]
    fn test_status_transitions() {
        let mut session = Session::initializing();
        assert_eq!(session.status(), AuthStatus::Initializing);
        assert!(!session.is_resolved());

        session.mark_resolved();
        assert_eq!(session.status(), AuthStatus::Unauthenticated);

        session.set_identity(Some(identity()));
        assert_eq!(session.status(), AuthStatus::Authenticated);
        assert_eq!(session.credential(), Some("abc"));

        session.set_identity(None);
        assert_eq!(session.status(), AuthStatus::Unauthenticated);
        assert!(session.profile().is_none());
        assert!(session.credential().is_none());
    }

    #[test]
    fn test_authenticated_requires_both_parts() {
        assert!(!Session::unauthenticated().is_authenticated());
        assert!(Session::authenticated(identity()).is_authenticated());
    }

    #[test]
    fn test_display_name_preference() {
        let profile = Profile {
            name: None,
            full_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@usd.edu".to_string()),
            ..Profile::default()
        };
        assert_eq!(profile.display_name(), "Ada Lovelace");

        let email_only = Profile {
            email: Some("ada@usd.edu".to_string()),
            ..Profile::default()
        };
        assert_eq!(email_only.display_name(), "ada@usd.edu");

        assert_eq!(Profile::named("A").display_name(), "A");
        assert_eq!(Profile::default().display_name(), "User");
    }

    #[test]
    fn test_well_formed_profile() {
        assert!(Profile::named("A").is_well_formed());
        assert!(!Profile::default().is_well_formed());
        assert!(!Profile::named("   ").is_well_formed());
    }

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let json = r#"{"email":"a@usd.edu","full_name":"A","user_type":"student","department":"Art"}"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.extra.get("department"), Some(&Value::from("Art")));

        let reparsed: Profile =
            serde_json::from_str(&serde_json::to_string(&profile).unwrap()).unwrap();
        assert_eq!(reparsed, profile);
    }
}
