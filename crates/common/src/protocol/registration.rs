use std::fmt;

use tracing::{debug, info};

use super::{Gate, ProtocolError, PseudonymizedRecord};
use crate::crypto::{PublicKey, SymmetricKey, WrappedKey};
use crate::remote::{Credentials, RegistrationRequest};

/// Artifacts derived from one symmetric key. Dropped as a unit.
#[derive(Clone)]
struct Derived {
    wrapped_key: WrappedKey,
    cipher_text: Vec<u8>,
}

/// Registration (encrypt) flow for one record
///
/// Steps must happen in order, and each one is gated on the previous
/// artifact:
///
/// 1. [`generate_key`](Self::generate_key): fresh symmetric key
/// 2. [`confirm_key_exported`](Self::confirm_key_exported): the holder says they kept a copy
/// 3. [`set_recipient_key`](Self::set_recipient_key): validated recipient public key
/// 4. + 5. [`pseudonymize`](Self::pseudonymize): wrap the key, then encrypt the data
/// 6. + 7. [`submission`](Self::submission): assemble the record once every gate is open
///
/// Changing any input (new key, new recipient, new data) discards the wrapped
/// key and cipher text derived from the old inputs.
#[derive(Default)]
pub struct Registration {
    key: Option<SymmetricKey>,
    key_exported: bool,
    recipient: Option<PublicKey>,
    personal_data: String,
    derived: Option<Derived>,
    credentials: Option<Credentials>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("has_key", &self.key.is_some())
            .field("key_exported", &self.key_exported)
            .field("has_recipient", &self.recipient.is_some())
            .field("personal_data_len", &self.personal_data.len())
            .field("pseudonymized", &self.derived.is_some())
            .finish()
    }
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh symmetric key, discarding anything derived from the previous one
    ///
    /// The export acknowledgement is reset too: the new key has not been saved yet.
    pub fn generate_key(&mut self) -> &SymmetricKey {
        if self.key.is_some() {
            info!("regenerating registration key, discarding derived artifacts");
        }
        self.derived = None;
        self.key_exported = false;
        self.key.insert(SymmetricKey::generate())
    }

    pub fn symmetric_key(&self) -> Option<&SymmetricKey> {
        self.key.as_ref()
    }

    /// Text to hand the holder for offline custody
    ///
    /// Exporting does not confirm anything by itself; the caller confirms
    /// once the copy is actually stored.
    pub fn export_key(&self) -> Option<String> {
        self.key.as_ref().map(SymmetricKey::to_hex)
    }

    /// Acknowledge that the holder kept a copy of the current key
    pub fn confirm_key_exported(&mut self) -> Result<(), ProtocolError> {
        if self.key.is_none() {
            return Err(ProtocolError::Blocked(Gate::KeyMissing));
        }
        self.key_exported = true;
        Ok(())
    }

    pub fn key_exported(&self) -> bool {
        self.key_exported
    }

    /// Set the recipient public key from its delivered text form
    ///
    /// A malformed key clears the recipient, so nothing can be wrapped under
    /// a key the caller no longer sees.
    pub fn set_recipient_key(&mut self, text: &str) -> Result<(), ProtocolError> {
        self.derived = None;
        match PublicKey::parse(text) {
            Ok(key) => {
                self.recipient = Some(key);
                Ok(())
            }
            Err(e) => {
                self.recipient = None;
                Err(ProtocolError::Crypto(e))
            }
        }
    }

    pub fn recipient(&self) -> Option<&PublicKey> {
        self.recipient.as_ref()
    }

    pub fn set_personal_data(&mut self, data: impl Into<String>) {
        let data = data.into();
        if data != self.personal_data {
            self.derived = None;
            self.personal_data = data;
        }
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    /// Gates still closed before [`pseudonymize`](Self::pseudonymize) may run
    pub fn pseudonymize_blockers(&self) -> Vec<Gate> {
        let mut gates = Vec::new();
        if self.key.is_none() {
            gates.push(Gate::KeyMissing);
        } else if !self.key_exported {
            gates.push(Gate::KeyNotExported);
        }
        if self.recipient.is_none() {
            gates.push(Gate::RecipientMissing);
        }
        if self.personal_data.is_empty() {
            gates.push(Gate::PersonalDataMissing);
        }
        gates
    }

    pub fn can_pseudonymize(&self) -> bool {
        self.pseudonymize_blockers().is_empty()
    }

    /// Wrap the symmetric key for the recipient, then encrypt the personal data
    pub fn pseudonymize(&mut self) -> Result<(), ProtocolError> {
        if let Some(gate) = self.pseudonymize_blockers().into_iter().next() {
            return Err(ProtocolError::Blocked(gate));
        }
        let (Some(key), Some(recipient)) = (self.key.as_ref(), self.recipient.as_ref()) else {
            return Err(ProtocolError::Blocked(Gate::KeyMissing));
        };

        let wrapped_key = WrappedKey::wrap(key, recipient)?;
        let cipher_text = key.encrypt(self.personal_data.as_bytes())?;
        debug!(cipher_len = cipher_text.len(), "personal data pseudonymized");

        self.derived = Some(Derived {
            wrapped_key,
            cipher_text,
        });
        Ok(())
    }

    pub fn wrapped_key(&self) -> Option<&WrappedKey> {
        self.derived.as_ref().map(|d| &d.wrapped_key)
    }

    pub fn cipher_text(&self) -> Option<&[u8]> {
        self.derived.as_ref().map(|d| d.cipher_text.as_slice())
    }

    /// Gates still closed before submission is allowed
    pub fn submit_blockers(&self) -> Vec<Gate> {
        let mut gates = self.pseudonymize_blockers();
        if self.derived.is_none() {
            gates.push(Gate::NotPseudonymized);
        }
        if !self.credentials.as_ref().is_some_and(Credentials::meets_policy) {
            gates.push(Gate::CredentialsTooShort);
        }
        gates
    }

    /// Gates closed by missing or invalid inputs
    ///
    /// Ignores the export and pseudonymize steps, so a caller can check the
    /// recipient, data and credentials before handing out the key.
    pub fn input_blockers(&self) -> Vec<Gate> {
        self.submit_blockers()
            .into_iter()
            .filter(|gate| !matches!(gate, Gate::KeyNotExported | Gate::NotPseudonymized))
            .collect()
    }

    pub fn can_submit(&self) -> bool {
        self.submit_blockers().is_empty()
    }

    /// Assemble the record and payload for submission
    ///
    /// Fails with the first closed gate; nothing is built in that case.
    pub fn submission(&self) -> Result<RegistrationRequest, ProtocolError> {
        if let Some(gate) = self.submit_blockers().into_iter().next() {
            return Err(ProtocolError::Blocked(gate));
        }
        let (Some(derived), Some(credentials)) = (self.derived.as_ref(), self.credentials.as_ref())
        else {
            return Err(ProtocolError::Blocked(Gate::NotPseudonymized));
        };
        let record = PseudonymizedRecord::new(
            credentials.login.clone(),
            derived.cipher_text.clone(),
            derived.wrapped_key,
        );
        Ok(RegistrationRequest::new(credentials, &record))
    }

    /// The record that [`submission`](Self::submission) would send
    pub fn record(&self) -> Option<PseudonymizedRecord> {
        let derived = self.derived.as_ref()?;
        let login = self.credentials.as_ref()?.login.clone();
        Some(PseudonymizedRecord::new(
            login,
            derived.cipher_text.clone(),
            derived.wrapped_key,
        ))
    }

    /// Forget all key material and inputs
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
