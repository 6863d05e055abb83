use clap::Args;

use common::protocol::recoverable;

use crate::cli::op::{settled, DispatchError};

/// List registered identities (administrators only)
#[derive(Args, Debug, Clone)]
pub struct Users;

#[derive(Debug, thiserror::Error)]
pub enum UsersError {
    #[error("failed to list identities: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Users {
    type Error = UsersError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let identities = settled(ctx.dispatcher.fetch_identities().await)?;

        let lines: Vec<String> = recoverable(&identities)
            .map(|identity| identity.login.clone())
            .collect();

        if lines.is_empty() {
            Ok("No identities found".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}
