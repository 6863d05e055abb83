use std::path::{Path, PathBuf};

use clap::Args;

use common::protocol::{ProtocolError, Registration};
use common::remote::{Credentials, Identity};

use crate::cli::op::{read_text, settled, write_new, DispatchError, OpContext};

/// Pseudonymize personal data and register it under a new account
///
/// The symmetric key is written to `--export-key` once every input gate is
/// open and before anything is encrypted; it is the only way the submitter
/// can read the data back. The file is removed again if the registration
/// does not go through.
#[derive(Args, Debug, Clone)]
pub struct Register {
    #[arg(long)]
    pub login: String,

    #[arg(long)]
    pub password: String,

    /// Personal data to pseudonymize
    #[arg(long, group = "personal_data")]
    pub data: Option<String>,

    /// Read the personal data from a file instead
    #[arg(long, group = "personal_data")]
    pub data_file: Option<PathBuf>,

    /// Recipient public key, as delivered by `key request`
    #[arg(long)]
    pub recipient_key_file: PathBuf,

    /// Where to export the symmetric key (must not exist yet)
    #[arg(long)]
    pub export_key: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("file error: {0}")]
    File(#[source] anyhow::Error),
    #[error("either --data or --data-file must be provided")]
    NoPersonalData,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("registration failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl Register {
    /// Steps after the key is exported: encrypt, then submit
    async fn submit(
        &self,
        ctx: &OpContext,
        registration: &mut Registration,
    ) -> Result<Identity, RegisterError> {
        registration.confirm_key_exported()?;
        registration.pseudonymize()?;
        Ok(settled(ctx.dispatcher.sign_up(registration).await?)?)
    }
}

fn discard_export(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), "failed to remove exported key: {}", e);
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let data = match (&self.data, &self.data_file) {
            (Some(data), _) => data.clone(),
            (None, Some(path)) => read_text(path).map_err(RegisterError::File)?,
            (None, None) => return Err(RegisterError::NoPersonalData),
        };
        let recipient = read_text(&self.recipient_key_file).map_err(RegisterError::File)?;

        let mut registration = Registration::new();
        registration.generate_key();
        registration.set_recipient_key(&recipient)?;
        registration.set_personal_data(data);
        registration.set_credentials(Credentials::new(self.login.clone(), self.password.clone()));
        if let Some(gate) = registration.input_blockers().into_iter().next() {
            return Err(ProtocolError::Blocked(gate).into());
        }

        if let Some(exported) = registration.export_key() {
            write_new(&self.export_key, &exported).map_err(RegisterError::File)?;
        }
        let identity = match self.submit(ctx, &mut registration).await {
            Ok(identity) => identity,
            Err(e) => {
                discard_export(&self.export_key);
                return Err(e);
            }
        };

        Ok(format!(
            "Registered {}\nSymmetric key exported to {}",
            identity.login,
            self.export_key.display()
        ))
    }
}
