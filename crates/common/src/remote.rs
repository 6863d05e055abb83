//! Contracts for the two remote services the protocol talks to.
//!
//! - [`AccountService`]: authentication, current identity, identity list, registration
//! - [`KeyDirectory`]: request delivery of a contact's public key, publish a new one
//!
//! Implementations classify every failure at the network boundary into a
//! [`RemoteFailure`]; nothing downstream inspects message text.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::protocol::PseudonymizedRecord;

/// Minimum length for login and password
pub const MIN_CREDENTIAL_LEN: usize = 4;
/// Minimum length for a key directory contact
pub const MIN_CONTACT_LEN: usize = 4;

/// Failure of a remote call, tagged where it happened
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteFailure {
    /// Bad credentials (401)
    #[error("unauthorized")]
    Unauthorized,
    /// Session no longer valid (403)
    #[error("forbidden")]
    Forbidden,
    /// Connectivity fault; the request may never have reached the server
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote error: {0}")]
    Other(String),
}

impl RemoteFailure {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, RemoteFailure::Forbidden)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteFailure::Transport(_))
    }
}

/// Login and password used to authenticate the submission channel
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"..")
            .finish()
    }
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }

    /// Both halves meet the minimum length policy
    pub fn meets_policy(&self) -> bool {
        self.login.chars().count() >= MIN_CREDENTIAL_LEN
            && self.password.chars().count() >= MIN_CREDENTIAL_LEN
    }
}

/// Opaque bearer token issued on authentication
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A registered account as the account API reports it
///
/// `user_data` is the base64 cipher text, `key_gost` the hex wrapped key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub login: String,
    #[serde(rename = "userData")]
    pub user_data: String,
    #[serde(rename = "keyGost")]
    pub key_gost: String,
}

/// Address the key directory delivers a public key to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contact(String);

fn contact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("static pattern compiles"))
}

impl Contact {
    /// Accept `text` if it looks like a mail address
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.chars().count() >= MIN_CONTACT_LEN && contact_pattern().is_match(text) {
            Some(Self(text.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Receipt for a key delivery request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyReceipt {
    pub result: bool,
    #[serde(rename = "messageId")]
    pub message_id: String,
}

/// Server report after publishing a new directory key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Number of stored records whose wrapped key was migrated
    #[serde(rename = "successModified")]
    pub success_modified: u64,
}

/// Registration payload as the account API expects it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub login: String,
    pub password: String,
    #[serde(rename = "userData")]
    pub user_data: String,
    #[serde(rename = "keyGost")]
    pub key_gost: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("login", &self.login)
            .field("password", &"..")
            .field("user_data_len", &self.user_data.len())
            .finish()
    }
}

impl RegistrationRequest {
    pub fn new(credentials: &Credentials, record: &PseudonymizedRecord) -> Self {
        Self {
            login: credentials.login.clone(),
            password: credentials.password.clone(),
            user_data: record.cipher_text_base64(),
            key_gost: record.wrapped_key().to_hex(),
        }
    }
}

/// Account API: authentication and identity records
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Exchange credentials for a session token
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, RemoteFailure>;

    /// The identity the current session belongs to
    async fn fetch_identity(&self) -> Result<Identity, RemoteFailure>;

    /// Every registered identity (administrators only)
    async fn fetch_identities(&self) -> Result<Vec<Identity>, RemoteFailure>;

    /// Create an account carrying a pseudonymized record
    async fn register(&self, request: &RegistrationRequest) -> Result<Identity, RemoteFailure>;
}

/// Remote key directory mapping contacts to their current public key
#[async_trait::async_trait]
pub trait KeyDirectory: Send + Sync {
    /// Ask the directory to deliver the public key for `contact`
    ///
    /// Delivery happens out of band; the key itself is not in the receipt.
    async fn request_key(&self, contact: &Contact) -> Result<KeyReceipt, RemoteFailure>;

    /// Replace the directory key; stored wrapped keys are migrated server-side
    async fn publish_key(&self, key: &PublicKey) -> Result<PublishReceipt, RemoteFailure>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_credentials_policy() {
        assert!(Credentials::new("user", "pass").meets_policy());
        assert!(!Credentials::new("usr", "password").meets_policy());
        assert!(!Credentials::new("username", "pwd").meets_policy());
        assert!(!Credentials::new("", "").meets_policy());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let printed = format!("{:?}", Credentials::new("alice", "hunter22"));
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter22"));
    }

    #[test]
    fn test_contact_parse() {
        assert!(Contact::parse("a@b.co").is_some());
        assert_eq!(
            Contact::parse("  admin@example.org ").unwrap().as_str(),
            "admin@example.org"
        );
        assert!(Contact::parse("a@b").is_none());
        assert!(Contact::parse("plainaddress").is_none());
        assert!(Contact::parse("").is_none());
    }

    #[test]
    fn test_identity_wire_names() {
        let json = r#"{"login":"alice","userData":"AAAA","keyGost":"ff"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.login, "alice");
        assert_eq!(identity.user_data, "AAAA");
        assert_eq!(identity.key_gost, "ff");
    }

    #[test]
    fn test_receipts_wire_names() {
        let receipt: KeyReceipt =
            serde_json::from_str(r#"{"result":true,"messageId":"m-1"}"#).unwrap();
        assert!(receipt.result);
        assert_eq!(receipt.message_id, "m-1");

        let publish: PublishReceipt = serde_json::from_str(r#"{"successModified":0}"#).unwrap();
        assert_eq!(publish.success_modified, 0);
    }

    #[test]
    fn test_failure_classification_helpers() {
        assert!(RemoteFailure::Forbidden.is_forbidden());
        assert!(RemoteFailure::Transport("refused".into()).is_transport());
        assert!(!RemoteFailure::Unauthorized.is_forbidden());
        assert!(!RemoteFailure::Other("500".into()).is_transport());
    }
}
