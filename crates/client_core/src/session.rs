use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Bearer token issued by `/users/login`, plus the email it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn new(access_token: impl Into<String>, email: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            email,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(&self.access_token)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    /// Drops the token. The email of the last login is kept for the next prompt.
    fn clear(&self) -> Result<()>;
    fn remembered_email(&self) -> Result<Option<String>>;
}

/// What a store keeps between runs: the live session, if any, and the last
/// email that logged in successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remembered_email: Option<String>,
}

impl StoredState {
    fn with_session(mut self, session: &Session) -> Self {
        if session.email.is_some() {
            self.remembered_email = session.email.clone();
        }
        self.session = Some(session.clone());
        self
    }

    fn without_session(self) -> Self {
        Self {
            session: None,
            ..self
        }
    }

    fn is_empty(&self) -> bool {
        self.session.is_none() && self.remembered_email.is_none()
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    state: Mutex<StoredState>,
}

impl MemorySessionStore {
    pub fn with_session(session: Session) -> Self {
        Self {
            state: Mutex::new(StoredState::default().with_session(&session)),
        }
    }

    fn update(&self, change: impl FnOnce(StoredState) -> StoredState) -> Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| ClientError::Session("session lock poisoned".into()))?;
        *guard = change(std::mem::take(&mut *guard));
        Ok(())
    }

    fn snapshot(&self) -> Result<StoredState> {
        let guard = self
            .state
            .lock()
            .map_err(|_| ClientError::Session("session lock poisoned".into()))?;
        Ok(guard.clone())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.snapshot()?.session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        self.update(|state| state.with_session(session))
    }

    fn clear(&self) -> Result<()> {
        self.update(StoredState::without_session)
    }

    fn remembered_email(&self) -> Result<Option<String>> {
        Ok(self.snapshot()?.remembered_email)
    }
}

/// Persists the session as JSON at a fixed path. A missing file means no session.
/// On unix the file is readable by its owner only.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_state(&self) -> Result<StoredState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredState::default())
            }
            Err(err) => return Err(ClientError::io(&self.path, err)),
        };
        if raw.trim().is_empty() {
            return Ok(StoredState::default());
        }
        serde_json::from_str(&raw).map_err(|err| {
            ClientError::Session(format!(
                "corrupt session file '{}': {err}",
                self.path.display()
            ))
        })
    }

    fn write_state(&self, state: &StoredState) -> Result<()> {
        if state.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(ClientError::io(&self.path, err)),
            };
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| ClientError::io(parent, err))?;
            }
        }
        let raw = serde_json::to_string_pretty(state)
            .map_err(|err| ClientError::Session(err.to_string()))?;
        write_private(&self.path, raw.as_bytes()).map_err(|err| ClientError::io(&self.path, err))
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::{
        io::Write,
        os::unix::fs::{OpenOptionsExt, PermissionsExt},
    };

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies when the file is created
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.read_state()?.session)
    }

    fn save(&self, session: &Session) -> Result<()> {
        let state = self.read_state().unwrap_or_default().with_session(session);
        self.write_state(&state)
    }

    fn clear(&self) -> Result<()> {
        let state = self.read_state().unwrap_or_default().without_session();
        self.write_state(&state)
    }

    fn remembered_email(&self) -> Result<Option<String>> {
        Ok(self.read_state()?.remembered_email)
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without checking its signature. The client
/// never holds the signing key; this only tells it when to stop sending the token.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;
    data.claims
        .exp
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0))
}
