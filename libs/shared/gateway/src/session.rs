use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use shared_models::{AppError, AuthState, User, UserType};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const USER_TYPE_KEY: &str = "userType";

/// Persistent string key/value storage backing the session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.clear();
        Ok(())
    }
}

/// Key/value pairs persisted as one JSON object. Every mutation rewrites the file.
pub struct FileSessionStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileSessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| AppError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            HashMap::new()
        };

        debug!("Opened session store at {} with {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AppError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
            }
        }

        let body = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, body)
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.clear();
        self.persist(&entries)
    }
}

fn poisoned() -> AppError {
    AppError::Storage("session store lock poisoned".to_string())
}

/// Explicit session context shared by the gateway and the services.
///
/// Lifecycle: [`Session::init`] at start-up restores whatever the store
/// holds, [`Session::establish`] after a successful login, and
/// [`Session::clear`] on logout.
pub struct Session {
    store: Arc<dyn SessionStore>,
    state: RwLock<Option<AuthState>>,
}

impl Session {
    /// Unreadable or partial stored auth is logged and treated as logged out.
    pub fn init(store: Arc<dyn SessionStore>) -> Self {
        let state = Self::load_stored_auth(store.as_ref());

        if let Some(auth) = &state {
            debug!("Restored {} session for user {}", auth.user_type, auth.user.id);
        }

        Self {
            store,
            state: RwLock::new(state),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemorySessionStore::new()),
            state: RwLock::new(None),
        }
    }

    // A partially written or unreadable session is treated as logged out.
    fn load_stored_auth(store: &dyn SessionStore) -> Option<AuthState> {
        let read = || -> Result<Option<AuthState>, AppError> {
            let (Some(token), Some(user), Some(user_type)) = (
                store.get(TOKEN_KEY)?,
                store.get(USER_KEY)?,
                store.get(USER_TYPE_KEY)?,
            ) else {
                return Ok(None);
            };

            let user: User = serde_json::from_str(&user)?;
            let user_type: UserType = user_type.parse()?;

            Ok(Some(AuthState { token, user, user_type }))
        };

        match read() {
            Ok(state) => state,
            Err(e) => {
                warn!("Error loading stored auth data: {}", e);
                None
            }
        }
    }

    pub fn establish(&self, auth: AuthState) -> Result<(), AppError> {
        self.store.set(TOKEN_KEY, &auth.token)?;
        self.store.set(USER_KEY, &serde_json::to_string(&auth.user)?)?;
        self.store.set(USER_TYPE_KEY, auth.user_type.as_str())?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        *state = Some(auth);
        Ok(())
    }

    /// Drops the credentials but keeps the user type so the next login
    /// defaults to the same role.
    pub fn clear(&self) -> Result<(), AppError> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        *state = None;
        Ok(())
    }

    pub fn current(&self) -> Option<AuthState> {
        self.state.read().ok().and_then(|state| state.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.as_ref().map(|auth| auth.token.clone()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn last_user_type(&self) -> Option<UserType> {
        if let Some(auth) = self.current() {
            return Some(auth.user_type);
        }
        self.store
            .get(USER_TYPE_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
    }

    /// Current auth state, or `Unauthorized` when nobody is logged in.
    pub fn require(&self) -> Result<AuthState, AppError> {
        self.current()
            .ok_or_else(|| AppError::Unauthorized("Your session has expired. Please login again.".to_string()))
    }

    pub fn require_role(&self, role: UserType) -> Result<AuthState, AppError> {
        let auth = self.require()?;
        if auth.user_type != role {
            return Err(AppError::Unauthorized(
                "You are not authorized to perform this action.".to_string(),
            ));
        }
        Ok(auth)
    }
}
