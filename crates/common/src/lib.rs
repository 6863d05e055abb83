/**
 * Cryptographic types and operations.
 *  - Ed25519 identity keys, convertible for X25519 agreement
 *  - ChaCha20-Poly1305 symmetric keys for record bodies
 *  - Symmetric keys wrapped to a recipient public key
 */
pub mod crypto;
/**
 * Routes remote outcomes through the lifecycles,
 *  the error router and the notification slot.
 */
pub mod dispatcher;
pub mod lifecycle;
pub mod notification;
/**
 * The pseudonymization protocol itself: registration
 *  assembly, recovery and key rotation.
 */
pub mod protocol;
/**
 * Wire types and service contracts for the
 *  account API and the key directory.
 */
pub mod remote;
pub mod router;
pub mod session;

pub mod prelude {
    pub use crate::crypto::{CryptoError, KeyPair, PrivateKey, PublicKey, SymmetricKey, WrappedKey};
    pub use crate::dispatcher::{AppModel, Dispatch, Dispatcher};
    pub use crate::lifecycle::{Lifecycle, LoadingState, Restart};
    pub use crate::notification::{Notification, NotificationChannel};
    pub use crate::protocol::{Gate, ProtocolError, PseudonymizedRecord, Registration, RotationOutcome};
    pub use crate::remote::{
        AccountService, Contact, Credentials, Identity, KeyDirectory, KeyReceipt, PublishReceipt,
        RegistrationRequest, RemoteFailure, SessionToken,
    };
    pub use crate::router::{ErrorRouter, RouterTarget};
    pub use crate::session::{MemoryTokenStore, Session, TokenStore, TokenStoreError};
}
