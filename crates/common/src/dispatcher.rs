//! Drives every network-bound operation through its lifecycle and the router.
//!
//! Each operation follows the same shape:
//!
//! 1. `start()` its [`Lifecycle`]; if rejected, return [`Dispatch::Dropped`]
//!    without touching the network
//! 2. await the remote call (the only suspension point)
//! 3. discard the reply if the session ended while it was in flight
//! 4. pass the outcome through the [`ErrorRouter`]
//! 5. settle the lifecycle and apply operation-specific notices
//!
//! The model lock is never held across step 2.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::PublicKey;
use crate::lifecycle::{Lifecycle, LoadingState};
use crate::notification::NotificationChannel;
use crate::protocol::{ProtocolError, Registration, RotationOutcome};
use crate::remote::{
    AccountService, Contact, Credentials, Identity, KeyDirectory, KeyReceipt, RemoteFailure,
};
use crate::router::{ErrorRouter, RouterTarget};
use crate::session::{Session, TokenStore};

/// Operation notices
pub mod notices {
    pub const SIGN_UP_SUCCEEDED: &str = "Registration successful";
    pub const SIGN_UP_FAILED: &str = "Registration failed";
    pub const KEY_REQUEST_SUCCEEDED: &str = "Key sent to your e-mail";
    pub const KEY_REQUEST_FAILED: &str = "Failed to send key";
    pub const KEY_CHANGED: &str = "Key changed successfully";
    pub const KEY_UNCHANGED: &str = "New and old keys are identical";
    pub const KEY_CHANGE_FAILED: &str = "Failed to change key";
}

/// Form-level message for rejected credentials
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

type Op<T> = Lifecycle<T, RemoteFailure>;

/// What happened to a dispatched operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// Lifecycle was busy; nothing was sent
    Dropped,
    /// The router absorbed the outcome (session terminated), or the
    /// session ended while the request was in flight
    Suppressed,
    /// The outcome as the subscriber sees it
    Settled(Result<T, RemoteFailure>),
}

impl<T> Dispatch<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            Dispatch::Settled(Ok(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Dispatch::Dropped)
    }
}

/// Everything the presentation layer renders from
#[derive(Debug)]
pub struct AppModel {
    session: Session,
    notifications: NotificationChannel,
    logging_in: Op<()>,
    fetching_identity: Op<Identity>,
    fetching_identities: Op<Vec<Identity>>,
    signing_up: Op<Identity>,
    requesting_key: Op<KeyReceipt>,
    publishing_key: Op<RotationOutcome>,
    /// Bumped on every logout
    session_epoch: u64,
}

/// Whether a reply still belongs to the session its request started in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Session,
    /// Unauthenticated calls (registration) survive a logout
    Detached,
}

impl AppModel {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            session: Session::new(tokens),
            notifications: NotificationChannel::default(),
            logging_in: Lifecycle::session_scoped("log_in"),
            fetching_identity: Lifecycle::session_scoped("fetch_identity"),
            fetching_identities: Lifecycle::repeatable("fetch_identities"),
            signing_up: Lifecycle::repeatable("sign_up"),
            requesting_key: Lifecycle::repeatable("request_key"),
            publishing_key: Lifecycle::repeatable("publish_key"),
            session_epoch: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationChannel {
        &self.notifications
    }

    pub fn logging_in(&self) -> &Op<()> {
        &self.logging_in
    }

    pub fn fetching_identity(&self) -> &Op<Identity> {
        &self.fetching_identity
    }

    pub fn fetching_identities(&self) -> &Op<Vec<Identity>> {
        &self.fetching_identities
    }

    pub fn signing_up(&self) -> &Op<Identity> {
        &self.signing_up
    }

    pub fn requesting_key(&self) -> &Op<KeyReceipt> {
        &self.requesting_key
    }

    pub fn publishing_key(&self) -> &Op<RotationOutcome> {
        &self.publishing_key
    }

    /// Message to show next to the login form, if any
    pub fn login_message(&self) -> Option<&'static str> {
        match self.logging_in.error() {
            Some(RemoteFailure::Unauthorized) => Some(INVALID_CREDENTIALS),
            _ => None,
        }
    }

    /// Log in failed or identity fetch failed: both settle together
    fn identity_failed(&mut self, failure: RemoteFailure) {
        if self.fetching_identity.is_pending() || self.logging_in.is_pending() {
            self.logging_in.fail(failure.clone());
            self.fetching_identity.fail(failure);
        }
    }

    fn identity_received(&mut self, identity: Identity) {
        if self.fetching_identity.succeed(identity.clone()) {
            self.logging_in.succeed(());
            self.session.establish(identity);
        }
    }

    /// Logout transition
    ///
    /// Settled session lifecycles return to their resting state with their
    /// outcome dropped. A run still in flight keeps its lifecycle until its
    /// reply arrives, and that reply is then discarded as stale.
    fn end_session(&mut self) {
        self.session.terminate();
        self.session_epoch += 1;
        self.fetching_identity.rest(LoadingState::Finish);
        self.logging_in.rest(LoadingState::Finish);
        self.fetching_identities.rest(LoadingState::Idle);
        self.requesting_key.rest(LoadingState::Idle);
        self.publishing_key.rest(LoadingState::Idle);
    }

    fn session_ended_since(&self, epoch: u64) -> bool {
        self.session_epoch != epoch
    }
}

impl RouterTarget for AppModel {
    fn terminate_session(&mut self) {
        self.end_session();
    }

    fn notify(&mut self, message: &str) {
        self.notifications.show(message);
    }
}

/// Shared handle; clones drive the same model
pub struct Dispatcher<S> {
    service: Arc<S>,
    model: Arc<Mutex<AppModel>>,
    router: Arc<ErrorRouter>,
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            model: self.model.clone(),
            router: self.router.clone(),
        }
    }
}

impl<S> Dispatcher<S>
where
    S: AccountService + KeyDirectory,
{
    pub fn new(service: Arc<S>, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_router(service, tokens, ErrorRouter::default())
    }

    pub fn with_router(service: Arc<S>, tokens: Arc<dyn TokenStore>, router: ErrorRouter) -> Self {
        Self {
            service,
            model: Arc::new(Mutex::new(AppModel::new(tokens))),
            router: Arc::new(router),
        }
    }

    /// Read the model
    pub fn read<R>(&self, f: impl FnOnce(&AppModel) -> R) -> R {
        f(&self.model.lock())
    }

    pub fn dismiss_notification(&self) {
        self.model.lock().notifications.dismiss();
    }

    async fn run<T, Fut>(
        &self,
        select: fn(&mut AppModel) -> &mut Op<T>,
        scope: Scope,
        call: Fut,
    ) -> Dispatch<T>
    where
        T: Clone,
        Fut: Future<Output = Result<T, RemoteFailure>>,
    {
        let epoch = {
            let mut model = self.model.lock();
            let op = select(&mut *model);
            if !op.start() {
                return Dispatch::Dropped;
            }
            info!(operation = op.name(), "operation started");
            model.session_epoch
        };

        let outcome = call.await;

        let mut model = self.model.lock();
        if scope == Scope::Session && model.session_ended_since(epoch) {
            let op = select(&mut *model);
            debug!(operation = op.name(), "session ended in flight, reply discarded");
            op.abandon();
            return Dispatch::Suppressed;
        }
        match self.router.route(outcome, &mut *model) {
            None => {
                select(&mut *model).abandon();
                Dispatch::Suppressed
            }
            Some(outcome) => {
                let op = select(&mut *model);
                match &outcome {
                    Ok(value) => {
                        op.succeed(value.clone());
                    }
                    Err(failure) => {
                        warn!(operation = op.name(), "operation failed: {}", failure);
                        op.fail(failure.clone());
                    }
                }
                Dispatch::Settled(outcome)
            }
        }
    }

    /// Authenticate, persist the token, then load the identity it belongs to
    pub async fn login(&self, credentials: &Credentials) -> Dispatch<Identity> {
        let epoch = {
            let mut model = self.model.lock();
            if !model.logging_in.start() {
                return Dispatch::Dropped;
            }
            model.session_epoch
        };
        info!(login = %credentials.login, "logging in");

        let outcome = self.service.authenticate(credentials).await;

        let token = {
            let mut model = self.model.lock();
            if model.session_ended_since(epoch) {
                debug!("session ended during log in, token discarded");
                model.logging_in.abandon();
                return Dispatch::Suppressed;
            }
            match self.router.route(outcome, &mut *model) {
                None => {
                    model.logging_in.abandon();
                    return Dispatch::Suppressed;
                }
                Some(Err(failure)) => {
                    model.identity_failed(failure.clone());
                    return Dispatch::Settled(Err(failure));
                }
                Some(Ok(token)) => token,
            }
        };

        let saved = self.model.lock().session.begin(&token);
        if let Err(e) = saved {
            let failure = RemoteFailure::Other(e.to_string());
            self.model.lock().identity_failed(failure.clone());
            return Dispatch::Settled(Err(failure));
        }

        self.fetch_identity().await
    }

    /// Load the identity of the current session
    ///
    /// Also the way to resume a session from a persisted token.
    pub async fn fetch_identity(&self) -> Dispatch<Identity> {
        let epoch = {
            let mut model = self.model.lock();
            if !model.fetching_identity.start() {
                return Dispatch::Dropped;
            }
            model.session_epoch
        };

        let outcome = self.service.fetch_identity().await;

        let mut model = self.model.lock();
        if model.session_ended_since(epoch) {
            debug!("session ended in flight, identity discarded");
            model.fetching_identity.abandon();
            model.logging_in.abandon();
            return Dispatch::Suppressed;
        }
        match self.router.route(outcome, &mut *model) {
            None => {
                model.fetching_identity.abandon();
                model.logging_in.abandon();
                Dispatch::Suppressed
            }
            Some(Ok(identity)) => {
                model.identity_received(identity.clone());
                Dispatch::Settled(Ok(identity))
            }
            Some(Err(failure)) => {
                model.identity_failed(failure.clone());
                Dispatch::Settled(Err(failure))
            }
        }
    }

    /// Resume a persisted session, if a token is stored
    pub async fn restore_session(&self) -> Option<Dispatch<Identity>> {
        let stored = self.model.lock().session.tokens().load();
        match stored {
            Ok(Some(_)) => Some(self.fetch_identity().await),
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read session token: {}", e);
                None
            }
        }
    }

    pub fn logout(&self) {
        self.model.lock().end_session();
    }

    pub async fn fetch_identities(&self) -> Dispatch<Vec<Identity>> {
        self.run(
            |m| &mut m.fetching_identities,
            Scope::Session,
            self.service.fetch_identities(),
        )
        .await
    }

    /// Submit a registration
    ///
    /// Closed gates fail before anything is started or sent. On success the
    /// registration is reset, dropping its key material.
    pub async fn sign_up(
        &self,
        registration: &mut Registration,
    ) -> Result<Dispatch<Identity>, ProtocolError> {
        let request = registration.submission()?;
        let dispatch = self
            .run(
                |m| &mut m.signing_up,
                Scope::Detached,
                self.service.register(&request),
            )
            .await;

        match &dispatch {
            Dispatch::Settled(Ok(identity)) => {
                info!(login = %identity.login, "registration accepted");
                self.model.lock().notify(notices::SIGN_UP_SUCCEEDED);
                registration.reset();
            }
            Dispatch::Settled(Err(_)) => self.model.lock().notify(notices::SIGN_UP_FAILED),
            Dispatch::Dropped | Dispatch::Suppressed => {}
        }
        Ok(dispatch)
    }

    /// Ask the key directory to deliver `contact`'s public key
    pub async fn request_key(&self, contact: &Contact) -> Dispatch<KeyReceipt> {
        let dispatch = self
            .run(
                |m| &mut m.requesting_key,
                Scope::Session,
                self.service.request_key(contact),
            )
            .await;

        match &dispatch {
            Dispatch::Settled(Ok(_)) => self.model.lock().notify(notices::KEY_REQUEST_SUCCEEDED),
            Dispatch::Settled(Err(_)) => self.model.lock().notify(notices::KEY_REQUEST_FAILED),
            Dispatch::Dropped | Dispatch::Suppressed => {}
        }
        dispatch
    }

    /// Publish a replacement directory key
    ///
    /// A zero migration count settles as [`RotationOutcome::Unchanged`], a success.
    pub async fn publish_key(&self, key: &PublicKey) -> Dispatch<RotationOutcome> {
        let call = async { self.service.publish_key(key).await.map(RotationOutcome::from) };
        let dispatch = self
            .run(|m| &mut m.publishing_key, Scope::Session, call)
            .await;

        match &dispatch {
            Dispatch::Settled(Ok(RotationOutcome::Migrated(_))) => {
                self.model.lock().notify(notices::KEY_CHANGED)
            }
            Dispatch::Settled(Ok(RotationOutcome::Unchanged)) => {
                self.model.lock().notify(notices::KEY_UNCHANGED)
            }
            Dispatch::Settled(Err(_)) => self.model.lock().notify(notices::KEY_CHANGE_FAILED),
            Dispatch::Dropped | Dispatch::Suppressed => {}
        }
        dispatch
    }
}
