//! Persisted login state and the actor context derived from it.
//!
//! Storage is a flat string key/value map (the shape of browser local
//! storage). The login response is written under two keys: the bearer token
//! and the JSON-encoded user.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use coachdesk_core::OrganizationId;

use crate::ActorContext;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const LOGGED_IN_AT_KEY: &str = "loggedInAt";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session state could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("session storage lock poisoned")]
    Poisoned,
}

/// Raw key/value storage for login state.
pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String) -> Result<(), SessionError>;
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;

    /// Write several keys. Stores that can do so apply them in one write;
    /// otherwise they are written in order and a failure stops the rest.
    fn set_items(&self, items: Vec<(&str, String)>) -> Result<(), SessionError> {
        for (key, value) in items {
            self.set_item(key, value)?;
        }
        Ok(())
    }
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), SessionError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        (**self).remove_item(key)
    }

    fn set_items(&self, items: Vec<(&str, String)>) -> Result<(), SessionError> {
        (**self).set_items(items)
    }
}

/// In-memory session storage for tests/dev.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.set_items(vec![(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut map = self.inner.write().map_err(|_| SessionError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    fn set_items(&self, items: Vec<(&str, String)>) -> Result<(), SessionError> {
        let mut map = self.inner.write().map_err(|_| SessionError::Poisoned)?;
        for (key, value) in items {
            map.insert(key.to_string(), value);
        }
        Ok(())
    }
}

/// Session storage backed by a single JSON object file.
///
/// A missing, unreadable or garbled file reads as an empty session. Writes
/// go to a sibling temp file that replaces the session file in one rename.
/// On unix the file is created owner-only (0600) since it holds the token.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return HashMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "session file is not a string map");
            HashMap::new()
        })
    }

    fn save(&self, map: &HashMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(map)?;

        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&tmp)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(raw.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set_item(&self, key: &str, value: String) -> Result<(), SessionError> {
        self.set_items(vec![(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut map = self.load();
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }

    fn set_items(&self, items: Vec<(&str, String)>) -> Result<(), SessionError> {
        let mut map = self.load();
        for (key, value) in items {
            map.insert(key.to_string(), value);
        }
        self.save(&map)
    }
}

/// The user object as the login endpoint returns it and as it is persisted.
///
/// Serialized as `{ email, organizationId, roleName }`. Decoding reads the
/// JSON object field by field so extra or overlapping keys never make the
/// whole user unreadable:
/// - organization: `organizationId`, `organization_id`, then `organization.id`
/// - role: `roleName`, `role_name`, then `role` as a string or `role.name`
///
/// The first usable candidate wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub email: String,
    pub organization_id: Option<OrganizationId>,
    pub role_name: String,
}

impl<'de> Deserialize<'de> for StoredUser {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(map) = Value::deserialize(deserializer)? else {
            return Err(de::Error::custom("user must be a JSON object"));
        };

        let email = map
            .get("email")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            email,
            organization_id: organization_from(&map),
            role_name: role_name_from(&map).unwrap_or_default(),
        })
    }
}

fn organization_from(map: &Map<String, Value>) -> Option<OrganizationId> {
    let nested = map.get("organization").and_then(|o| o.get("id"));
    ["organizationId", "organization_id"]
        .iter()
        .filter_map(|key| map.get(*key))
        .chain(nested)
        .find_map(|v| OrganizationId::deserialize(v).ok())
}

fn role_name_from(map: &Map<String, Value>) -> Option<String> {
    let text = |v: &Value| v.as_str().filter(|s| !s.trim().is_empty()).map(str::to_string);
    ["roleName", "role_name", "role"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(|v| text(v).or_else(|| v.get("name").and_then(text)))
}

/// Successful login response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: StoredUser,
}

/// Typed access to the login state held by a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionState<S> {
    store: S,
}

impl<S: SessionStore> SessionState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The bearer token, if one is stored and non-blank.
    pub fn token(&self) -> Option<String> {
        self.store
            .get_item(TOKEN_KEY)
            .filter(|t| !t.trim().is_empty())
    }

    /// The persisted user, or `None` when absent or not decodable.
    pub fn current_user(&self) -> Option<StoredUser> {
        let raw = self.store.get_item(USER_KEY)?;
        match serde_json::from_str::<StoredUser>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "persisted user is malformed; ignoring it");
                None
            }
        }
    }

    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.get_item(LOGGED_IN_AT_KEY)?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Persist a successful login, replacing any previous session.
    ///
    /// The previous session is cleared first and the token is written last,
    /// so a failed write can never pair a new token with an old user.
    pub fn persist_login(&self, login: &LoginResponse, now: DateTime<Utc>) -> Result<(), SessionError> {
        let user = serde_json::to_string(&login.user)?;
        self.logout()?;
        self.store.set_items(vec![
            (USER_KEY, user),
            (LOGGED_IN_AT_KEY, now.to_rfc3339()),
            (TOKEN_KEY, login.token.clone()),
        ])?;
        tracing::info!(email = %login.user.email, "login persisted");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.remove_item(TOKEN_KEY)?;
        self.store.remove_item(USER_KEY)?;
        self.store.remove_item(LOGGED_IN_AT_KEY)?;
        Ok(())
    }
}

/// Derive the current actor from persisted login state.
///
/// Never fails: no session or an undecodable one yields the default
/// (unauthenticated) context, which grants no elevated scope.
pub fn resolve_actor_context<S: SessionStore>(session: &SessionState<S>) -> ActorContext {
    match session.current_user() {
        Some(user) => ActorContext {
            email: user.email,
            organization_id: user.organization_id,
            role_name: user.role_name,
        },
        None => {
            tracing::debug!("no usable session; resolving default actor");
            ActorContext::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn org(id: u64) -> OrganizationId {
        OrganizationId::new(id).unwrap()
    }

    fn session() -> SessionState<MemorySessionStore> {
        SessionState::new(MemorySessionStore::new())
    }

    #[test]
    fn empty_session_resolves_default_actor() {
        let actor = resolve_actor_context(&session());
        assert_eq!(actor, ActorContext::default());
        assert_eq!(actor.role_name, "");
        assert_eq!(actor.organization_id, None);
        assert!(!actor.is_authenticated());
    }

    #[test]
    fn garbled_user_resolves_default_actor() {
        let state = session();
        state.store().set_item(USER_KEY, "{not json".to_string()).unwrap();
        assert_eq!(resolve_actor_context(&state), ActorContext::default());

        state.store().set_item(USER_KEY, "[1,2,3]".to_string()).unwrap();
        assert_eq!(resolve_actor_context(&state), ActorContext::default());
    }

    #[test]
    fn stringified_and_invalid_organization_ids() {
        let state = session();
        state
            .store()
            .set_item(
                USER_KEY,
                r#"{"email":"a@x.io","organizationId":"5","roleName":" Admin "}"#.to_string(),
            )
            .unwrap();
        let actor = resolve_actor_context(&state);
        assert_eq!(actor.organization_id, Some(org(5)));
        assert_eq!(actor.role(), Role::OrgAdmin);

        state
            .store()
            .set_item(
                USER_KEY,
                r#"{"email":"a@x.io","organizationId":-1,"roleName":"admin"}"#.to_string(),
            )
            .unwrap();
        assert_eq!(resolve_actor_context(&state).organization_id, None);
    }

    #[test]
    fn accepts_snake_case_aliases() {
        let user: StoredUser =
            serde_json::from_str(r#"{"email":"b@x.io","organization_id":3,"role":"Super Admin"}"#)
                .unwrap();
        assert_eq!(user.organization_id, Some(org(3)));
        assert_eq!(user.role_name, "Super Admin");
    }

    #[test]
    fn persist_then_logout() {
        let state = session();
        let login = LoginResponse {
            token: "tok-1".to_string(),
            user: StoredUser {
                email: "c@x.io".to_string(),
                organization_id: Some(org(9)),
                role_name: "admin".to_string(),
            },
        };
        let now = Utc::now();
        state.persist_login(&login, now).unwrap();

        assert_eq!(state.token().as_deref(), Some("tok-1"));
        assert_eq!(state.current_user(), Some(login.user.clone()));
        assert_eq!(
            state.logged_in_at().map(|t| t.timestamp()),
            Some(now.timestamp())
        );
        assert_eq!(
            resolve_actor_context(&state),
            ActorContext::new("c@x.io", Some(org(9)), "admin")
        );

        state.logout().unwrap();
        assert_eq!(state.token(), None);
        assert_eq!(resolve_actor_context(&state), ActorContext::default());
    }

    #[test]
    fn blank_token_is_absent() {
        let state = session();
        state.store().set_item(TOKEN_KEY, "   ".to_string()).unwrap();
        assert_eq!(state.token(), None);
    }

    #[test]
    fn file_store_round_trips_and_tolerates_garbage() {
        let path = std::env::temp_dir().join(format!(
            "coachdesk-session-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = FileSessionStore::new(&path);
        assert_eq!(store.get_item(TOKEN_KEY), None);

        store.set_item(TOKEN_KEY, "abc".to_string()).unwrap();
        assert_eq!(FileSessionStore::new(&path).get_item(TOKEN_KEY).as_deref(), Some("abc"));

        std::fs::write(&path, "garbage").unwrap();
        assert_eq!(store.get_item(TOKEN_KEY), None);

        store.remove_item(TOKEN_KEY).unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn overlapping_role_and_organization_keys_still_resolve() {
        let state = session();
        state
            .store()
            .set_item(
                USER_KEY,
                r#"{"email":"a@x.io","organizationId":5,"roleName":"admin","role":{"id":2,"name":"admin"},"organization_id":"5"}"#
                    .to_string(),
            )
            .unwrap();

        let actor = resolve_actor_context(&state);
        assert_eq!(actor, ActorContext::new("a@x.io", Some(org(5)), "admin"));
        assert_eq!(
            crate::evaluate_scope(&actor, coachdesk_core::ResourceType::Batches),
            crate::ScopeDecision::organization(Some(org(5)))
        );
    }

    #[test]
    fn role_and_organization_fall_back_to_nested_objects() {
        let user: StoredUser = serde_json::from_str(
            r#"{"email":"n@x.io","roleName":"  ","role":{"name":"Admin"},"organizationId":"abc","organization":{"id":8}}"#,
        )
        .unwrap();
        assert_eq!(user.role_name, "Admin");
        assert_eq!(user.organization_id, Some(org(8)));

        let persisted = serde_json::to_value(&user).unwrap();
        assert_eq!(persisted["roleName"], "Admin");
        assert_eq!(persisted["organizationId"], 8);
    }

    /// Fails every write of the user key.
    struct UserWriteFails(MemorySessionStore);

    impl SessionStore for UserWriteFails {
        fn get_item(&self, key: &str) -> Option<String> {
            self.0.get_item(key)
        }

        fn set_item(&self, key: &str, value: String) -> Result<(), SessionError> {
            if key == USER_KEY {
                return Err(SessionError::Io(std::io::Error::other("disk full")));
            }
            self.0.set_item(key, value)
        }

        fn remove_item(&self, key: &str) -> Result<(), SessionError> {
            self.0.remove_item(key)
        }
    }

    #[test]
    fn failed_login_write_never_pairs_new_token_with_old_user() {
        let inner = MemorySessionStore::new();
        inner.set_item(TOKEN_KEY, "old-token".to_string()).unwrap();
        inner
            .set_item(
                USER_KEY,
                r#"{"email":"old@x.io","organizationId":1,"roleName":"admin"}"#.to_string(),
            )
            .unwrap();
        let state = SessionState::new(UserWriteFails(inner));

        let login = LoginResponse {
            token: "new-token".to_string(),
            user: StoredUser {
                email: "new@x.io".to_string(),
                organization_id: Some(org(2)),
                role_name: "admin".to_string(),
            },
        };
        assert!(state.persist_login(&login, Utc::now()).is_err());

        assert_eq!(state.token(), None);
        assert_eq!(resolve_actor_context(&state), ActorContext::default());
    }

    #[test]
    fn poisoned_memory_store_reports_write_failures() {
        let store = Arc::new(MemorySessionStore::new());
        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(
            store.set_item(TOKEN_KEY, "t".to_string()),
            Err(SessionError::Poisoned)
        ));
        assert!(matches!(store.remove_item(TOKEN_KEY), Err(SessionError::Poisoned)));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!(
            "coachdesk-perm-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let store = FileSessionStore::new(&path);
        store
            .set_items(vec![(USER_KEY, "{}".to_string()), (TOKEN_KEY, "secret".to_string())])
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get_item(TOKEN_KEY).as_deref(), Some("secret"));
        let _ = std::fs::remove_file(&path);
    }
}
