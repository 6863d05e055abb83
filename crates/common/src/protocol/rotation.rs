use std::fmt;

use super::ProtocolError;
use crate::crypto::PublicKey;
use crate::remote::PublishReceipt;

/// What publishing a new directory key changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// This many stored wrapped keys were migrated to the new key
    Migrated(u64),
    /// Nothing migrated: the new key is the one already published
    Unchanged,
}

impl From<PublishReceipt> for RotationOutcome {
    fn from(receipt: PublishReceipt) -> Self {
        match receipt.success_modified {
            0 => RotationOutcome::Unchanged,
            n => RotationOutcome::Migrated(n),
        }
    }
}

impl fmt::Display for RotationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationOutcome::Migrated(n) => write!(f, "key changed, {} record(s) migrated", n),
            RotationOutcome::Unchanged => f.write_str("new and old keys are identical"),
        }
    }
}

/// Validate an externally supplied replacement key before it may be published
pub fn replacement_key(text: &str) -> Result<PublicKey, ProtocolError> {
    Ok(PublicKey::parse(text)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_zero_modified_is_unchanged() {
        let outcome = RotationOutcome::from(PublishReceipt {
            success_modified: 0,
        });
        assert_eq!(outcome, RotationOutcome::Unchanged);
        assert_eq!(outcome.to_string(), "new and old keys are identical");
    }

    #[test]
    fn test_modified_count_is_reported() {
        let outcome = RotationOutcome::from(PublishReceipt {
            success_modified: 3,
        });
        assert_eq!(outcome, RotationOutcome::Migrated(3));
    }

    #[test]
    fn test_replacement_key_is_validated() {
        let pair = KeyPair::generate();
        assert_eq!(
            replacement_key(&pair.public().to_pem()).unwrap(),
            *pair.public()
        );
        // long enough to pass a length heuristic, still not a key
        assert!(replacement_key(&"A".repeat(300)).is_err());
    }
}
