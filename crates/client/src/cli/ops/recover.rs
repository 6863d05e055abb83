use std::path::PathBuf;

use clap::Args;

use common::protocol::{recover_with_private_key, recover_with_symmetric_key, recoverable};

use crate::cli::op::{read_text, settled, DispatchError};

/// De-pseudonymize registered data
///
/// With `--symmetric-key`, reads back the logged-in account's own record.
/// With `--private-key`, reads every listed record (administrators).
#[derive(Args, Debug, Clone)]
pub struct Recover {
    /// Exported symmetric key file (data owner)
    #[arg(long, group = "recovery_key")]
    pub symmetric_key: Option<PathBuf>,

    /// Recipient private key file (key custodian)
    #[arg(long, group = "recovery_key")]
    pub private_key: Option<PathBuf>,

    /// Only recover this login (with --private-key)
    #[arg(long)]
    pub login: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error("file error: {0}")]
    File(#[source] anyhow::Error),
    #[error("either --symmetric-key or --private-key must be provided")]
    NoKey,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("no identity with login {0}")]
    UnknownLogin(String),
    #[error("recovery failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Recover {
    type Error = RecoverError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if let Some(path) = &self.symmetric_key {
            let key_text = read_text(path).map_err(RecoverError::File)?;
            let dispatch = ctx
                .dispatcher
                .restore_session()
                .await
                .ok_or(RecoverError::NotLoggedIn)?;
            let identity = settled(dispatch)?;

            return Ok(match recover_with_symmetric_key(&identity, &key_text) {
                Ok(data) => data,
                Err(e) => format!("{}: {}", identity.login, e),
            });
        }

        let Some(path) = &self.private_key else {
            return Err(RecoverError::NoKey);
        };
        let key_text = read_text(path).map_err(RecoverError::File)?;
        let identities = settled(ctx.dispatcher.fetch_identities().await)?;

        let selected: Vec<_> = recoverable(&identities)
            .filter(|identity| self.login.as_ref().map_or(true, |l| *l == identity.login))
            .collect();
        if let (Some(login), true) = (&self.login, selected.is_empty()) {
            return Err(RecoverError::UnknownLogin(login.clone()));
        }

        let lines: Vec<String> = selected
            .into_iter()
            .map(|identity| match recover_with_private_key(identity, &key_text) {
                Ok(data) => format!("{}: {}", identity.login, data),
                Err(e) => format!("{}: {}", identity.login, e),
            })
            .collect();

        if lines.is_empty() {
            Ok("No identities found".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}
