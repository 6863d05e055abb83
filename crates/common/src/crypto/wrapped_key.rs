//! Wrapping a symmetric key for a recipient using ECDH + AES Key Wrap
//!
//! To wrap a key for a recipient:
//! 1. **Generate ephemeral keypair**: a throwaway Ed25519 key
//! 2. **Perform ECDH**: convert both keys to X25519 and compute the shared secret
//! 3. **Wrap key**: AES-KW (RFC 3394) the symmetric key under the shared secret
//! 4. **Package**: `ephemeral_pubkey || wrapped_key`
//!
//! The recipient repeats the ECDH with their private key and unwraps.
//! Unwrapping reports a single [`CryptoError::DecryptFailure`] no matter
//! which part of the input was wrong.

use std::convert::TryFrom;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{PrivateKey, PublicKey, PUBLIC_KEY_SIZE};
use super::symmetric::{SymmetricKey, SYMMETRIC_KEY_SIZE};
use super::CryptoError;

/// Size of AES Key Wrap integrity block in bytes
pub const KW_NONCE_SIZE: usize = 8;
/// Total size of a wrapped key in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_key (40) = 72 bytes
pub const WRAPPED_KEY_SIZE: usize = PUBLIC_KEY_SIZE + SYMMETRIC_KEY_SIZE + KW_NONCE_SIZE;

/// A symmetric key encrypted under a recipient's public key
///
/// Safe to transmit and store. Only the holder of the matching private key
/// can turn it back into the [`SymmetricKey`].
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_key: 40 bytes ]
/// ```
///
/// Serialized as a hex string.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct WrappedKey([u8; WRAPPED_KEY_SIZE]);

impl Serialize for WrappedKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        WrappedKey::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&[u8]> for WrappedKey {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != WRAPPED_KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial("wrapped key has wrong length"));
        }
        let mut buff = [0; WRAPPED_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(WrappedKey(buff))
    }
}

impl WrappedKey {
    /// Parse a wrapped key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; WRAPPED_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| CryptoError::InvalidKeyMaterial("wrapped key hex decode error"))?;
        Ok(WrappedKey(buff))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Wrap `key` so that only the holder of `recipient`'s private key can recover it
    ///
    /// # Errors
    ///
    /// [`CryptoError::InvalidKeyMaterial`] if the recipient key cannot be used
    /// for key agreement. Nothing is produced on failure.
    pub fn wrap(key: &SymmetricKey, recipient: &PublicKey) -> Result<Self, CryptoError> {
        let ephemeral_private = PrivateKey::generate();
        let ephemeral_public = ephemeral_private.public();

        let ephemeral_x25519_private = ephemeral_private.to_x25519();
        let recipient_x25519_public = recipient.to_x25519()?;

        let shared_secret = ephemeral_x25519_private.diffie_hellman(&recipient_x25519_public);
        if !shared_secret.was_contributory() {
            return Err(CryptoError::InvalidKeyMaterial(
                "recipient key yields a non-contributory shared secret",
            ));
        }

        let kek = Kek::from(*shared_secret.as_bytes());
        let wrapped = kek
            .wrap_vec(key.bytes())
            .map_err(|_| CryptoError::InvalidKeyMaterial("key wrap rejected input"))?;

        let ephemeral_bytes = ephemeral_public.to_bytes();
        if ephemeral_bytes.len() + wrapped.len() != WRAPPED_KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial("wrapped key size mismatch"));
        }

        let mut out = [0u8; WRAPPED_KEY_SIZE];
        out[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_bytes);
        out[PUBLIC_KEY_SIZE..].copy_from_slice(&wrapped);

        Ok(WrappedKey(out))
    }

    /// Recover the symmetric key with the recipient's private key
    ///
    /// # Security Note
    ///
    /// A failure means the key was wrapped for someone else, the bytes were
    /// corrupted, or they were tampered with. Callers cannot tell which.
    pub fn unwrap(&self, recipient_secret: &PrivateKey) -> Result<SymmetricKey, CryptoError> {
        let ephemeral_public = PublicKey::try_from(&self.0[..PUBLIC_KEY_SIZE])
            .map_err(|_| CryptoError::DecryptFailure)?;

        let recipient_x25519_private = recipient_secret.to_x25519();
        let ephemeral_x25519_public = ephemeral_public
            .to_x25519()
            .map_err(|_| CryptoError::DecryptFailure)?;

        let shared_secret = recipient_x25519_private.diffie_hellman(&ephemeral_x25519_public);
        if !shared_secret.was_contributory() {
            return Err(CryptoError::DecryptFailure);
        }

        let kek = Kek::from(*shared_secret.as_bytes());
        let unwrapped = kek
            .unwrap_vec(&self.0[PUBLIC_KEY_SIZE..])
            .map_err(|_| CryptoError::DecryptFailure)?;

        SymmetricKey::from_slice(&unwrapped).map_err(|_| CryptoError::DecryptFailure)
    }
}
