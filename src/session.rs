use crate::errors::AuthFailure;
use crate::gateway::RemoteGateway;
use crate::models::{Session, User};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

/// What the front end should show while deciding between login form and board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// Persisted credentials have not been read yet.
    Undetermined,
    SignedOut,
    SignedIn(User),
}

#[derive(Debug, Default)]
struct SessionState {
    restore_started: bool,
    determined: bool,
    session: Option<Session>,
}

/// Owns the credential lifecycle, in memory and in the durable store.
pub struct SessionStore<S> {
    storage: S,
    state: Mutex<SessionState>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn phase(&self) -> AuthPhase {
        self.with_state(|state| match (&state.session, state.determined) {
            (Some(session), _) => AuthPhase::SignedIn(session.user.clone()),
            (None, true) => AuthPhase::SignedOut,
            (None, false) => AuthPhase::Undetermined,
        })
    }

    pub fn session(&self) -> Option<Session> {
        self.with_state(|state| state.session.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.with_state(|state| state.session.as_ref().map(|s| s.token.clone()))
    }

    pub fn user(&self) -> Option<User> {
        self.with_state(|state| state.session.as_ref().map(|s| s.user.clone()))
    }

    /// Reads the persisted credentials once per process. Malformed or partial data is wiped.
    pub async fn restore(&self) -> AuthPhase {
        let first = self.with_state(|state| !std::mem::replace(&mut state.restore_started, true));
        if !first {
            warn!("session restore requested more than once; ignoring");
            return self.phase();
        }

        let token = self.read(TOKEN_KEY).await;
        let user = self.read(USER_KEY).await;

        let restored = match (token, user) {
            (Some(token), Some(raw_user)) if !token.trim().is_empty() => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Session { token, user }),
                    Err(err) => {
                        warn!("discarding malformed persisted user: {err}");
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                warn!("discarding partial persisted session");
                None
            }
        };

        if restored.is_none() {
            self.clear_persisted().await;
        }

        self.with_state(|state| {
            // a login that finished while we were reading wins
            if state.session.is_none() {
                state.session = restored;
            }
            state.determined = true;
        });

        let phase = self.phase();
        if let AuthPhase::SignedIn(user) = &phase {
            info!("restored session for {}", user.username);
        }
        phase
    }

    /// On failure the prior state, in memory and on disk, is left untouched.
    pub async fn login<G: RemoteGateway>(
        &self,
        gateway: &G,
        identifier: &str,
        secret: &str,
    ) -> Result<User, AuthFailure> {
        let session = gateway.login(identifier, secret).await?;
        Ok(self.establish(session).await)
    }

    pub async fn register<G: RemoteGateway>(
        &self,
        gateway: &G,
        username: &str,
        email: &str,
        secret: &str,
    ) -> Result<User, AuthFailure> {
        let session = gateway.register(username, email, secret).await?;
        Ok(self.establish(session).await)
    }

    /// Forgets the session locally. The server is not told.
    pub async fn logout(&self) {
        let previous = self.with_state(|state| {
            state.determined = true;
            state.session.take()
        });
        self.clear_persisted().await;
        if let Some(session) = previous {
            info!("signed out {}", session.user.username);
        }
    }

    async fn establish(&self, session: Session) -> User {
        let user = session.user.clone();
        match serde_json::to_string(&user) {
            Ok(raw_user) => {
                if let Err(err) = self.storage.set(TOKEN_KEY, &session.token).await {
                    warn!("failed to persist token: {err}");
                }
                if let Err(err) = self.storage.set(USER_KEY, &raw_user).await {
                    warn!("failed to persist user: {err}");
                }
            }
            Err(err) => warn!("failed to serialize user: {err}"),
        }
        self.with_state(|state| {
            state.session = Some(session);
            state.determined = true;
        });
        info!("signed in as {}", user.username);
        user
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!("failed to read {key} from session storage: {err}");
                None
            }
        }
    }

    async fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(err) = self.storage.remove(key).await {
                warn!("failed to clear {key} from session storage: {err}");
            }
        }
    }
}
