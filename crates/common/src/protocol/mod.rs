//! Hybrid-encryption pseudonymization protocol
//!
//! - [`Registration`]: generate key → confirm export → recipient key → wrap + encrypt → submit
//! - [`recover_with_private_key`] / [`recover_with_symmetric_key`]: the reverse direction
//! - [`RotationOutcome`]: result of replacing the key directory's public key
//!
//! Unmet preconditions are reported as [`Gate`]s and block the step outright.

mod record;
mod recovery;
mod registration;
mod rotation;

pub use record::PseudonymizedRecord;
pub use recovery::{
    recover_with_private_key, recover_with_symmetric_key, recoverable, RecoveryError,
    ADMIN_LOGIN,
};
pub use registration::Registration;
pub use rotation::{replacement_key, RotationOutcome};

use crate::crypto::CryptoError;

/// A precondition that keeps a protocol step disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    KeyMissing,
    KeyNotExported,
    RecipientMissing,
    PersonalDataMissing,
    NotPseudonymized,
    CredentialsTooShort,
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Gate::KeyMissing => "no symmetric key generated",
            Gate::KeyNotExported => "symmetric key not confirmed exported",
            Gate::RecipientMissing => "no valid recipient public key",
            Gate::PersonalDataMissing => "personal data is empty",
            Gate::NotPseudonymized => "data not pseudonymized yet",
            Gate::CredentialsTooShort => "login and password must be at least 4 characters",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("step blocked: {0}")]
    Blocked(Gate),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
