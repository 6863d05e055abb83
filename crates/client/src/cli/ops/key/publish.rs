use std::path::PathBuf;

use clap::Args;

use common::protocol::{replacement_key, ProtocolError};

use crate::cli::op::{read_text, settled, DispatchError};

/// Replace the directory key; stored records are migrated server-side
#[derive(Args, Debug, Clone)]
pub struct Publish {
    /// PEM or hex public key file
    #[arg(long)]
    pub key_file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("file error: {0}")]
    File(#[source] anyhow::Error),
    #[error(transparent)]
    InvalidKey(#[from] ProtocolError),
    #[error("key publish failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Publish {
    type Error = PublishError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let text = read_text(&self.key_file).map_err(PublishError::File)?;
        let key = replacement_key(&text)?;

        let outcome = settled(ctx.dispatcher.publish_key(&key).await)?;
        Ok(outcome.to_string())
    }
}
