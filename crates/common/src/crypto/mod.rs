//! Cryptographic primitives for pseudonymization
//!
//! - **Recipient keys**: Ed25519 key pairs (`KeyPair`/`PublicKey`/`PrivateKey`),
//!   converted to X25519 for key agreement
//! - **Bulk encryption**: ChaCha20-Poly1305 under a per-registration `SymmetricKey`
//! - **Key wrapping**: ECDH with an ephemeral key + AES-KW, packaged as a `WrappedKey`
//!
//! # Hybrid scheme
//!
//! Personal data is encrypted locally with a fresh `SymmetricKey`. That key is
//! wrapped under the recipient's `PublicKey` and stored next to the cipher
//! text. The recipient (or anyone holding the exported symmetric key) can
//! reverse it:
//!
//! 1. `WrappedKey::unwrap(private_key)` yields the symmetric key
//! 2. `SymmetricKey::decrypt(cipher_text)` yields the data
//!
//! Both reverse steps fail with the same [`CryptoError::DecryptFailure`].

mod keys;
mod symmetric;
mod wrapped_key;

pub use keys::{KeyPair, PrivateKey, PublicKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use symmetric::{SymmetricKey, NONCE_SIZE, SYMMETRIC_KEY_SIZE};
pub use wrapped_key::{WrappedKey, WRAPPED_KEY_SIZE};

/// Errors produced by the cryptographic layer
///
/// These never leave the client. Messages carry no key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(&'static str),
    #[error("decryption failed")]
    DecryptFailure,
    #[error("system random source unavailable")]
    Entropy,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hybrid_scenario() {
        let pair = KeyPair::generate();
        let key = SymmetricKey::generate();

        let wrapped = WrappedKey::wrap(&key, pair.public()).unwrap();
        let cipher = key.encrypt(b"secret-data").unwrap();

        let recovered = wrapped.unwrap(pair.private()).unwrap();
        assert_eq!(recovered.decrypt(&cipher).unwrap(), b"secret-data");
    }

    #[test]
    fn test_wrong_key_never_yields_plaintext() {
        let plaintext = b"secret-data";
        for _ in 0..16 {
            let k1 = SymmetricKey::generate();
            let k2 = SymmetricKey::generate();
            let cipher = k1.encrypt(plaintext).unwrap();
            match k2.decrypt(&cipher) {
                Ok(other) => assert_ne!(other, plaintext),
                Err(e) => assert_eq!(e, CryptoError::DecryptFailure),
            }
        }
    }
}
