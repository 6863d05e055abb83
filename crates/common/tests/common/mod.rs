//! Shared test utilities: an in-memory account API and key directory
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use common::crypto::{KeyPair, PublicKey};
use common::dispatcher::Dispatcher;
use common::protocol::Registration;
use common::remote::{
    AccountService, Contact, Credentials, Identity, KeyDirectory, KeyReceipt, PublishReceipt,
    RegistrationRequest, RemoteFailure, SessionToken,
};
use common::session::{MemoryTokenStore, TokenStore};

/// Account API plus key directory, backed by hash maps
///
/// Reads the current token from the same store the dispatcher writes to,
/// the way the HTTP client does.
pub struct FakeService {
    tokens: Arc<MemoryTokenStore>,
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    sessions: Mutex<HashMap<String, String>>,
    directory_key: Mutex<PublicKey>,
    outbox: Mutex<Vec<(Contact, PublicKey)>>,
    scripted: Mutex<HashMap<&'static str, RemoteFailure>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeService {
    pub fn new(tokens: Arc<MemoryTokenStore>, directory_key: PublicKey) -> Self {
        Self {
            tokens,
            accounts: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            directory_key: Mutex::new(directory_key),
            outbox: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            hold: Mutex::new(None),
        }
    }

    /// Make every later call to `op` fail with `failure`
    pub fn script(&self, op: &'static str, failure: RemoteFailure) {
        self.scripted.lock().insert(op, failure);
    }

    pub fn clear_script(&self) {
        self.scripted.lock().clear();
    }

    /// Park every call until [`release`](Self::release)
    pub fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock() = Some(notify.clone());
        notify
    }

    pub fn release(&self) {
        if let Some(notify) = self.hold.lock().take() {
            notify.notify_one();
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().get(op).copied().unwrap_or(0)
    }

    /// Public keys the directory has "mailed"
    pub fn delivered(&self) -> Vec<(Contact, PublicKey)> {
        self.outbox.lock().clone()
    }

    /// Insert an account without going through registration
    pub fn seed_account(&self, login: &str, password: &str) -> Identity {
        let identity = Identity {
            login: login.to_string(),
            user_data: String::new(),
            key_gost: String::new(),
        };
        self.accounts
            .lock()
            .insert(login.to_string(), (password.to_string(), identity.clone()));
        identity
    }

    async fn enter(&self, op: &'static str) -> Result<(), RemoteFailure> {
        *self.calls.lock().entry(op).or_default() += 1;
        let hold = self.hold.lock().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
        let scripted = self.scripted.lock().get(op).cloned();
        match scripted {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    fn current_login(&self) -> Result<String, RemoteFailure> {
        let token = self
            .tokens
            .load()
            .map_err(|e| RemoteFailure::Other(e.to_string()))?
            .ok_or(RemoteFailure::Unauthorized)?;
        self.sessions
            .lock()
            .get(token.as_str())
            .cloned()
            .ok_or(RemoteFailure::Forbidden)
    }
}

#[async_trait]
impl AccountService for FakeService {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, RemoteFailure> {
        self.enter("authenticate").await?;
        let accounts = self.accounts.lock();
        match accounts.get(&credentials.login) {
            Some((password, _)) if *password == credentials.password => {
                let token = format!("token-{}-{}", credentials.login, self.sessions.lock().len());
                self.sessions
                    .lock()
                    .insert(token.clone(), credentials.login.clone());
                Ok(SessionToken::new(token))
            }
            _ => Err(RemoteFailure::Unauthorized),
        }
    }

    async fn fetch_identity(&self) -> Result<Identity, RemoteFailure> {
        self.enter("fetch_identity").await?;
        let login = self.current_login()?;
        self.accounts
            .lock()
            .get(&login)
            .map(|(_, identity)| identity.clone())
            .ok_or(RemoteFailure::Forbidden)
    }

    async fn fetch_identities(&self) -> Result<Vec<Identity>, RemoteFailure> {
        self.enter("fetch_identities").await?;
        self.current_login()?;
        let mut identities: Vec<Identity> = self
            .accounts
            .lock()
            .values()
            .map(|(_, identity)| identity.clone())
            .collect();
        identities.sort_by(|a, b| a.login.cmp(&b.login));
        Ok(identities)
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<Identity, RemoteFailure> {
        self.enter("register").await?;
        let mut accounts = self.accounts.lock();
        if accounts.contains_key(&request.login) {
            return Err(RemoteFailure::Other("login already taken".into()));
        }
        let identity = Identity {
            login: request.login.clone(),
            user_data: request.user_data.clone(),
            key_gost: request.key_gost.clone(),
        };
        accounts.insert(
            request.login.clone(),
            (request.password.clone(), identity.clone()),
        );
        Ok(identity)
    }
}

#[async_trait]
impl KeyDirectory for FakeService {
    async fn request_key(&self, contact: &Contact) -> Result<KeyReceipt, RemoteFailure> {
        self.enter("request_key").await?;
        let key = *self.directory_key.lock();
        let mut outbox = self.outbox.lock();
        outbox.push((contact.clone(), key));
        Ok(KeyReceipt {
            result: true,
            message_id: format!("msg-{}", outbox.len()),
        })
    }

    async fn publish_key(&self, key: &PublicKey) -> Result<PublishReceipt, RemoteFailure> {
        self.enter("publish_key").await?;
        self.current_login()?;
        let mut current = self.directory_key.lock();
        if *current == *key {
            return Ok(PublishReceipt {
                success_modified: 0,
            });
        }
        *current = *key;
        let migrated = self
            .accounts
            .lock()
            .values()
            .filter(|(_, identity)| !identity.key_gost.is_empty())
            .count() as u64;
        Ok(PublishReceipt {
            success_modified: migrated,
        })
    }
}

pub struct TestEnv {
    pub directory: KeyPair,
    pub tokens: Arc<MemoryTokenStore>,
    pub service: Arc<FakeService>,
    pub dispatcher: Dispatcher<FakeService>,
}

/// Fresh service, empty token store, dispatcher with the default router
pub fn setup_test_env() -> TestEnv {
    let directory = KeyPair::generate();
    let tokens = Arc::new(MemoryTokenStore::new());
    let service = Arc::new(FakeService::new(tokens.clone(), *directory.public()));
    let dispatcher = Dispatcher::new(service.clone(), tokens.clone());
    TestEnv {
        directory,
        tokens,
        service,
        dispatcher,
    }
}

/// A registration with every gate open, ready to submit
pub fn ready_registration(recipient: &PublicKey, login: &str, data: &str) -> Registration {
    let mut registration = Registration::new();
    registration.generate_key();
    registration.confirm_key_exported().unwrap();
    registration.set_recipient_key(&recipient.to_pem()).unwrap();
    registration.set_personal_data(data);
    registration.set_credentials(Credentials::new(login, "password"));
    registration.pseudonymize().unwrap();
    registration
}
