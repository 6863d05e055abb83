use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::WrappedKey;

/// Pseudonymized personal data ready for submission
///
/// Only [`super::Registration`] can build one, which is what guarantees that
/// `cipher_text` was produced under the very key `wrapped_key` wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudonymizedRecord {
    owner_id: String,
    cipher_text: Vec<u8>,
    wrapped_key: WrappedKey,
}

impl PseudonymizedRecord {
    pub(crate) fn new(owner_id: String, cipher_text: Vec<u8>, wrapped_key: WrappedKey) -> Self {
        Self {
            owner_id,
            cipher_text,
            wrapped_key,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn cipher_text(&self) -> &[u8] {
        &self.cipher_text
    }

    /// Transport form of the cipher text
    pub fn cipher_text_base64(&self) -> String {
        STANDARD.encode(&self.cipher_text)
    }

    pub fn wrapped_key(&self) -> &WrappedKey {
        &self.wrapped_key
    }
}
