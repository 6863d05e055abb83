//! Session record: who is logged in, and where the token lives.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::remote::{Identity, SessionToken};

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token store error: {0}")]
    Backend(String),
}

/// Durable home of the session token
///
/// The token is the only state persisted across runs.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<SessionToken>, TokenStoreError>;
    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Token store that forgets everything when dropped
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SessionToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: SessionToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SessionToken>, TokenStoreError> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        *self.token.lock() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// The current session
pub struct Session {
    tokens: Arc<dyn TokenStore>,
    identity: Option<Identity>,
    authenticated: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity.as_ref().map(|i| &i.login))
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            tokens,
            identity: None,
            authenticated: false,
        }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Persist a freshly issued token
    pub fn begin(&mut self, token: &SessionToken) -> Result<(), TokenStoreError> {
        self.tokens.save(token)
    }

    /// Identity confirmed by the server: the session is live
    pub fn establish(&mut self, identity: Identity) {
        tracing::info!(login = %identity.login, "session established");
        self.identity = Some(identity);
        self.authenticated = true;
    }

    /// Drop the identity and the persisted token
    pub fn terminate(&mut self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!("failed to clear session token: {}", e);
        }
        self.identity = None;
        self.authenticated = false;
        tracing::info!("session terminated");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_terminate_clears_token_and_identity() {
        let store = Arc::new(MemoryTokenStore::new());
        let mut session = Session::new(store.clone());

        session.begin(&SessionToken::new("t-1")).unwrap();
        session.establish(Identity {
            login: "alice".into(),
            user_data: String::new(),
            key_gost: String::new(),
        });
        assert!(session.is_authenticated());
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("t-1")));

        session.terminate();
        assert!(!session.is_authenticated());
        assert!(session.identity().is_none());
        assert_eq!(store.load().unwrap(), None);
    }
}
