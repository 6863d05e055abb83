use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::crypto::{PrivateKey, SymmetricKey, WrappedKey};
use crate::remote::Identity;

/// Login of the administrator account, never listed for recovery
pub const ADMIN_LOGIN: &str = "Admin";

/// The only thing recovery ever reports
///
/// A wrong private key, a wrong symmetric key, a corrupted wrapped key and
/// corrupted cipher text are indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RecoveryError {
    #[error("invalid key")]
    InvalidKey,
}

fn cipher_text(identity: &Identity) -> Result<Vec<u8>, RecoveryError> {
    STANDARD
        .decode(identity.user_data.trim())
        .map_err(|_| RecoveryError::InvalidKey)
}

fn plaintext(key: &SymmetricKey, identity: &Identity) -> Result<String, RecoveryError> {
    let bytes = key
        .decrypt(&cipher_text(identity)?)
        .map_err(|_| RecoveryError::InvalidKey)?;
    String::from_utf8(bytes).map_err(|_| RecoveryError::InvalidKey)
}

/// De-pseudonymize with the exported symmetric key (the data owner's path)
pub fn recover_with_symmetric_key(
    identity: &Identity,
    key_text: &str,
) -> Result<String, RecoveryError> {
    let result = SymmetricKey::from_hex(key_text)
        .map_err(|_| RecoveryError::InvalidKey)
        .and_then(|key| plaintext(&key, identity));
    if result.is_err() {
        debug!(login = %identity.login, "symmetric recovery failed");
    }
    result
}

/// De-pseudonymize with the recipient private key (the key custodian's path)
///
/// Unwraps the stored symmetric key first, then decrypts the data.
pub fn recover_with_private_key(
    identity: &Identity,
    private_key_text: &str,
) -> Result<String, RecoveryError> {
    let result = PrivateKey::parse(private_key_text)
        .and_then(|private_key| WrappedKey::from_hex(&identity.key_gost)?.unwrap(&private_key))
        .map_err(|_| RecoveryError::InvalidKey)
        .and_then(|key| plaintext(&key, identity));
    if result.is_err() {
        debug!(login = %identity.login, "private key recovery failed");
    }
    result
}

/// Identities a key custodian can recover, without the administrator account
pub fn recoverable(identities: &[Identity]) -> impl Iterator<Item = &Identity> {
    identities.iter().filter(|i| i.login != ADMIN_LOGIN)
}
