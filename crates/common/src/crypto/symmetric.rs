//! Bulk data encryption using ChaCha20-Poly1305
//!
//! Every registration gets its own `SymmetricKey`. The key never leaves the
//! client in the clear: it is either exported by its holder for offline
//! custody or wrapped under a recipient public key (see [`super::WrappedKey`]).

use std::fmt;

use chacha20poly1305::Key;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

use super::CryptoError;

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SYMMETRIC_KEY_SIZE: usize = 32;
/// Size of BLAKE3 hash in bytes (256 bits)
pub const BLAKE3_HASH_SIZE: usize = 32;

/// A 256-bit key for the bulk cipher
///
/// The encrypted format is: `nonce (12 bytes) || encrypted(hash(32 bytes) || plaintext) || tag (16 bytes)`.
/// The BLAKE3 hash of the plaintext is sealed together with the plaintext so
/// a decryption that passes authentication is also checked for content integrity.
///
/// A fresh nonce is drawn for every call to [`SymmetricKey::encrypt`], so two
/// encryptions of the same plaintext differ. Round trips always hold.
///
/// # Examples
///
/// ```ignore
/// let key = SymmetricKey::generate();
/// let cipher_text = key.encrypt(b"personal data")?;
/// assert_eq!(key.decrypt(&cipher_text)?, b"personal data");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl From<[u8; SYMMETRIC_KEY_SIZE]> for SymmetricKey {
    fn from(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        SymmetricKey(bytes)
    }
}

impl SymmetricKey {
    /// Generate a new random key using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SYMMETRIC_KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SYMMETRIC_KEY_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        if data.len() != SYMMETRIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial(
                "symmetric key has wrong length",
            ));
        }
        let mut buff = [0; SYMMETRIC_KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Parse the exported text form (hex, optionally "0x"-prefixed)
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; SYMMETRIC_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| CryptoError::InvalidKeyMaterial("symmetric key hex decode error"))?;
        Ok(buff.into())
    }

    /// Text form used when the holder exports the key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// # Errors
    ///
    /// Only fails if the system RNG cannot produce a nonce.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let plaintext_hash = blake3::hash(data);

        let mut data_with_hash = Vec::with_capacity(BLAKE3_HASH_SIZE + data.len());
        data_with_hash.extend_from_slice(plaintext_hash.as_bytes());
        data_with_hash.extend_from_slice(data);

        let key = Key::from_slice(self.bytes());
        let cipher = ChaCha20Poly1305::new(key);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).map_err(|_| CryptoError::Entropy)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data_with_hash.as_ref())
            .map_err(|_| CryptoError::Entropy)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(ciphertext.as_ref());

        Ok(out)
    }

    /// Decrypt data using ChaCha20-Poly1305 AEAD
    ///
    /// Every way this can go wrong (truncated input, wrong key, tampered
    /// bytes, hash mismatch) yields the same [`CryptoError::DecryptFailure`].
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < NONCE_SIZE {
            return Err(CryptoError::DecryptFailure);
        }

        let key = Key::from_slice(self.bytes());
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let cipher = ChaCha20Poly1305::new(key);
        let decrypted = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| CryptoError::DecryptFailure)?;

        if decrypted.len() < BLAKE3_HASH_SIZE {
            return Err(CryptoError::DecryptFailure);
        }

        let stored_hash = &decrypted[..BLAKE3_HASH_SIZE];
        let plaintext = &decrypted[BLAKE3_HASH_SIZE..];

        let computed_hash = blake3::hash(plaintext);
        if stored_hash != computed_hash.as_bytes() {
            return Err(CryptoError::DecryptFailure);
        }

        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let data = "Иванов Иван Иванович, паспорт 0000 000000".as_bytes();

        let encrypted = key.encrypt(data).unwrap();
        let decrypted = key.decrypt(&encrypted).unwrap();

        assert_eq!(data, decrypted.as_slice());
    }

    #[test]
    fn test_encryption_uses_fresh_nonce() {
        let key = SymmetricKey::generate();
        let a = key.encrypt(b"same input").unwrap();
        let b = key.encrypt(b"same input").unwrap();
        assert_ne!(a, b);
        assert_eq!(key.decrypt(&a).unwrap(), key.decrypt(&b).unwrap());
    }

    #[test]
    fn test_wrong_key_fails_generically() {
        let right = SymmetricKey::generate();
        let wrong = SymmetricKey::generate();
        let encrypted = right.encrypt(b"secret-data").unwrap();

        assert_eq!(wrong.decrypt(&encrypted), Err(CryptoError::DecryptFailure));
    }

    #[test]
    fn test_truncated_and_tampered_input() {
        let key = SymmetricKey::generate();
        let mut encrypted = key.encrypt(b"test data for integrity check").unwrap();

        assert_eq!(key.decrypt(&[]), Err(CryptoError::DecryptFailure));
        assert_eq!(
            key.decrypt(&encrypted[..NONCE_SIZE - 1]),
            Err(CryptoError::DecryptFailure)
        );

        encrypted[NONCE_SIZE + 10] ^= 0xFF;
        assert_eq!(key.decrypt(&encrypted), Err(CryptoError::DecryptFailure));
    }

    #[test]
    fn test_key_size_validation() {
        assert!(SymmetricKey::from_slice(&[1u8; 16]).is_err());
        assert!(SymmetricKey::from_slice(&[1u8; 64]).is_err());
        assert!(SymmetricKey::from_slice(&[1u8; SYMMETRIC_KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_hex_export() {
        let key = SymmetricKey::generate();
        let text = key.to_hex();
        assert_eq!(text.len(), SYMMETRIC_KEY_SIZE * 2);
        assert_eq!(SymmetricKey::from_hex(&format!("{text}\n")).unwrap(), key);
        assert!(SymmetricKey::from_hex(&text[..40]).is_err());
    }

    #[test]
    fn test_empty_data_encryption() {
        let key = SymmetricKey::generate();
        let encrypted = key.encrypt(b"").unwrap();
        assert_eq!(key.decrypt(&encrypted).unwrap(), Vec::<u8>::new());
    }
}
