use std::fmt;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{SigningKey, VerifyingKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::CryptoError;

/// Size of Ed25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of Ed25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

const PUBLIC_PEM_TAG: &str = "PUBLIC KEY";
const PRIVATE_PEM_TAG: &str = "PRIVATE KEY";

/// Public half of a recipient key pair
///
/// Safe to hand out: it is what the key directory serves and what
/// symmetric keys get wrapped under. Construction always validates that the
/// bytes decode to a point on the curve outside the small-order subgroup, so
/// holding a `PublicKey` means the key is well-formed and usable for key
/// agreement.
///
/// # Examples
///
/// ```ignore
/// let pair = KeyPair::generate();
/// let pem = pair.public().to_pem();
/// let parsed = PublicKey::parse(&pem)?;
/// assert_eq!(parsed, *pair.public());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(VerifyingKey);

impl TryFrom<&[u8]> for PublicKey {
    type Error = CryptoError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial("public key has wrong length"));
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        let key = VerifyingKey::from_bytes(&buff)
            .map_err(|_| CryptoError::InvalidKeyMaterial("public key is not a curve point"))?;
        // small-order points force an all-zero shared secret
        if key.is_weak() {
            return Err(CryptoError::InvalidKeyMaterial("public key is a small-order point"));
        }
        Ok(PublicKey(key))
    }
}

impl PublicKey {
    /// Parse a public key from its text form
    ///
    /// Accepts PEM (tag `PUBLIC KEY`), plain hex, or "0x"-prefixed hex.
    /// Surrounding whitespace is ignored.
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        let text = text.trim();
        if text.starts_with("-----BEGIN") {
            Self::from_pem(text)
        } else {
            Self::from_hex(text)
        }
    }

    /// Parse a public key from a hexadecimal string
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex)
            .map_err(|_| CryptoError::InvalidKeyMaterial("public key hex decode error"))?;
        Self::try_from(bytes.as_slice())
    }

    /// Parse a public key from PEM format
    pub fn from_pem(pem_str: &str) -> Result<Self, CryptoError> {
        let pem = pem::parse(pem_str)
            .map_err(|_| CryptoError::InvalidKeyMaterial("public key is not valid PEM"))?;
        if pem.tag() != PUBLIC_PEM_TAG {
            return Err(CryptoError::InvalidKeyMaterial(
                "invalid PEM tag, expected PUBLIC KEY",
            ));
        }
        Self::try_from(pem.contents())
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Encode public key in PEM format with tag "PUBLIC KEY"
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PUBLIC_PEM_TAG, self.to_bytes()))
    }

    /// Convert Ed25519 public key to X25519 (Montgomery curve) for ECDH
    ///
    /// Ed25519 uses the Edwards curve, while the key agreement behind
    /// wrapping needs the Montgomery form.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn to_x25519(&self) -> Result<X25519PublicKey, CryptoError> {
        let edwards_bytes = self.to_bytes();
        let edwards_point = CompressedEdwardsY::from_slice(&edwards_bytes)
            .map_err(|_| CryptoError::InvalidKeyMaterial("public key invalid edwards point"))?
            .decompress()
            .ok_or(CryptoError::InvalidKeyMaterial(
                "public key failed to decompress edwards point",
            ))?;

        let montgomery_point = edwards_point.to_montgomery();
        Ok(X25519PublicKey::from(montgomery_point.to_bytes()))
    }

    /// The Edwards identity, bypassing the small-order check
    #[cfg(test)]
    pub(crate) fn identity_point() -> Self {
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes[0] = 1;
        PublicKey(VerifyingKey::from_bytes(&bytes).unwrap())
    }
}

/// Private half of a recipient key pair
///
/// Owned exclusively by its holder. It is never sent anywhere by this crate;
/// the only durable copy is whatever the holder exports with [`PrivateKey::to_pem`].
/// `Debug` output is redacted.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for PrivateKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(SigningKey::from_bytes(&secret))
    }
}

impl PrivateKey {
    /// Generate a new random private key using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        Self::from(bytes)
    }

    /// Parse a private key from its text form (PEM or hex)
    pub fn parse(text: &str) -> Result<Self, CryptoError> {
        let text = text.trim();
        if text.starts_with("-----BEGIN") {
            Self::from_pem(text)
        } else {
            Self::from_hex(text)
        }
    }

    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; PRIVATE_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| CryptoError::InvalidKeyMaterial("private key hex decode error"))?;
        Ok(Self::from(buff))
    }

    /// Parse a private key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The key size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, CryptoError> {
        let pem = pem::parse(pem_str)
            .map_err(|_| CryptoError::InvalidKeyMaterial("private key is not valid PEM"))?;

        if pem.tag() != PRIVATE_PEM_TAG {
            return Err(CryptoError::InvalidKeyMaterial(
                "invalid PEM tag, expected PRIVATE KEY",
            ));
        }

        let contents = pem.contents();
        if contents.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::InvalidKeyMaterial(
                "private key has wrong length",
            ));
        }

        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        bytes.copy_from_slice(contents);
        Ok(Self::from(bytes))
    }

    /// Derive the public key from this private key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Encode private key in PEM format with tag "PRIVATE KEY"
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PRIVATE_PEM_TAG, self.to_bytes()))
    }

    /// Convert Ed25519 secret key to X25519 (Montgomery curve) for ECDH
    ///
    /// The scalar bytes of the Ed25519 key are used directly as the X25519 private key.
    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0.to_scalar_bytes())
    }
}

/// A freshly generated recipient key pair
///
/// Held only in transient memory. Persisting either half is the caller's
/// business (export to file).
#[derive(Debug, Clone)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Generate an independent key pair; never reuses material from earlier calls.
    pub fn generate() -> Self {
        let private = PrivateKey::generate();
        Self {
            public: private.public(),
            private,
        }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn private(&self) -> &PrivateKey {
        &self.private
    }

    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let pair = KeyPair::generate();

        let private_hex = hex::encode(pair.private().to_bytes());
        let recovered_private = PrivateKey::from_hex(&private_hex).unwrap();
        assert_eq!(pair.private().to_bytes(), recovered_private.to_bytes());

        let recovered_public = PublicKey::from_hex(&pair.public().to_hex()).unwrap();
        assert_eq!(*pair.public(), recovered_public);
    }

    #[test]
    fn test_generated_pairs_are_independent() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.public(), b.public());
        assert_ne!(a.private().to_bytes(), b.private().to_bytes());
    }

    #[test]
    fn test_pem_serialization() {
        let pair = KeyPair::generate();

        let recovered_private = PrivateKey::parse(&pair.private().to_pem()).unwrap();
        assert_eq!(pair.private().to_bytes(), recovered_private.to_bytes());
        assert_eq!(recovered_private.public(), *pair.public());

        let recovered_public = PublicKey::parse(&pair.public().to_pem()).unwrap();
        assert_eq!(recovered_public, *pair.public());
    }

    #[test]
    fn test_public_key_rejects_malformed_input() {
        assert!(PublicKey::parse("").is_err());
        assert!(PublicKey::parse("not a key").is_err());
        assert!(PublicKey::from_hex(&"ab".repeat(31)).is_err());

        // a private key PEM is not a public key
        let private_pem = PrivateKey::generate().to_pem();
        assert!(matches!(
            PublicKey::parse(&private_pem),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn test_public_key_rejects_small_order_points() {
        let mut identity = [0u8; PUBLIC_KEY_SIZE];
        identity[0] = 1;
        assert_eq!(
            PublicKey::from_hex(&hex::encode(identity)),
            Err(CryptoError::InvalidKeyMaterial("public key is a small-order point"))
        );

        let pem = pem::encode(&pem::Pem::new(PUBLIC_PEM_TAG, identity.to_vec()));
        assert!(PublicKey::parse(&pem).is_err());

        // order-2 point (0, -1)
        let mut minus_one = [0xffu8; PUBLIC_KEY_SIZE];
        minus_one[0] = 0xec;
        minus_one[31] = 0x7f;
        assert!(PublicKey::try_from(minus_one.as_slice()).is_err());
    }

    #[test]
    fn test_public_key_parse_tolerates_whitespace() {
        let pair = KeyPair::generate();
        let padded = format!("\n  {}  \n", pair.public().to_pem());
        assert_eq!(PublicKey::parse(&padded).unwrap(), *pair.public());
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKey::generate();
        let printed = format!("{:?}", key);
        assert_eq!(printed, "PrivateKey(..)");
        assert!(!printed.contains(&hex::encode(key.to_bytes())));
    }
}
