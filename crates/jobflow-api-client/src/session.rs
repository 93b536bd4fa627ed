//! Session context.
//!
//! The session is the bearer token plus the cached user record. It is held in
//! memory by [`Session`] and mirrored to a [`SessionStore`] directory so a later
//! invocation can pick it up again. Lifecycle:
//!
//! * `Session::hydrate` loads whatever the store holds,
//! * `ApiClient::revalidate_session` optionally confirms it with `/auth/me`,
//! * `Session::establish` records a fresh login/register,
//! * `Session::teardown` clears both memory and storage (logout, or any 401).

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jobflow_core::models::{AuthResponse, User};
use jobflow_core::ApiError;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_data.json";

/// On-disk key/value pair standing in for browser storage. Each call reads or
/// writes one whole file.
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read_key(&self, key: &str) -> Result<Option<String>, ApiError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_key(&self, key: &str, contents: &str) -> Result<(), ApiError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.key_path(key);
        fs::write(&path, contents)?;
        restrict_permissions(&path)?;
        Ok(())
    }

    fn remove_key(&self, key: &str) -> Result<(), ApiError> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_token(&self) -> Result<Option<String>, ApiError> {
        Ok(self
            .read_key(TOKEN_KEY)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    pub fn save_token(&self, token: &str) -> Result<(), ApiError> {
        self.write_key(TOKEN_KEY, token)
    }

    pub fn remove_token(&self) -> Result<(), ApiError> {
        self.remove_key(TOKEN_KEY)
    }

    /// Cached user record. A record that fails to parse is removed and
    /// reported as absent.
    pub fn load_user(&self) -> Result<Option<User>, ApiError> {
        let Some(raw) = self.read_key(USER_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, path = %self.key_path(USER_KEY).display(), "Failed to parse cached user data, clearing it");
                self.remove_user()?;
                Ok(None)
            }
        }
    }

    pub fn save_user(&self, user: &User) -> Result<(), ApiError> {
        let json = serde_json::to_string(user)
            .map_err(|e| ApiError::Storage(format!("Failed to serialize user: {}", e)))?;
        self.write_key(USER_KEY, &json)
    }

    pub fn remove_user(&self) -> Result<(), ApiError> {
        self.remove_key(USER_KEY)
    }

    pub fn clear(&self) -> Result<(), ApiError> {
        self.remove_token()?;
        self.remove_user()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ApiError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ApiError> {
    Ok(())
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
}

/// In-memory session backed by a [`SessionStore`].
#[derive(Debug)]
pub struct Session {
    store: SessionStore,
    state: RwLock<SessionState>,
}

impl Session {
    /// Empty session; nothing is read from the store.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Restore the session persisted in `store`. A cached user without a
    /// token is not trusted and is dropped.
    pub fn hydrate(store: SessionStore) -> Result<Self> {
        let token = store
            .load_token()
            .context("Failed to read stored auth token")?;
        let user = match token {
            Some(_) => store.load_user().context("Failed to read stored user")?,
            None => None,
        };

        debug!(
            has_token = token.is_some(),
            has_user = user.is_some(),
            "Hydrated session from {}",
            store.dir().display()
        );

        Ok(Self {
            store,
            state: RwLock::new(SessionState { token, user }),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        let state = self.state.read().await;
        state.token.is_some() && state.user.is_some()
    }

    /// Run a store operation on the blocking pool.
    async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&SessionStore) -> Result<T, ApiError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ApiError::Storage(format!("Session storage task failed: {}", e)))?
    }

    /// Record a successful login/register: token and user go to memory and
    /// storage.
    pub async fn establish(&self, auth: &AuthResponse) -> Result<()> {
        let mut state = self.state.write().await;
        let token = auth.access_token.clone();
        self.with_store(move |store| store.save_token(&token))
            .await
            .context("Failed to persist auth token")?;
        state.token = Some(auth.access_token.clone());

        if let Some(user) = &auth.user {
            let record = user.clone();
            self.with_store(move |store| store.save_user(&record))
                .await
                .context("Failed to persist user")?;
            state.user = Some(user.clone());
            info!(user_id = user.id, "Session established");
        }
        Ok(())
    }

    /// Replace the cached user after revalidation.
    pub async fn update_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        let record = user.clone();
        self.with_store(move |store| store.save_user(&record))
            .await
            .context("Failed to persist user")?;
        state.user = Some(user);
        Ok(())
    }

    /// Clear token and user from memory and storage. In-memory state is reset
    /// even when storage cannot be cleared.
    pub async fn teardown(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let had_session = state.token.is_some();
        *state = SessionState::default();
        self.with_store(|store| store.clear())
            .await
            .context("Failed to clear stored session")?;
        if had_session {
            info!("Session cleared");
        }
        Ok(())
    }
}
