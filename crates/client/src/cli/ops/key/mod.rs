use clap::{Args, Subcommand};

pub mod publish;
pub mod request;

use crate::cli::op::Op;

crate::command_enum! {
    (Request, request::Request),
    (Publish, publish::Publish),
}

// Rename the generated Command to KeyCommand for clarity
pub type KeyCommand = Command;

/// Talk to the key directory
#[derive(Args, Debug, Clone)]
pub struct Key {
    #[command(subcommand)]
    pub command: KeyCommand,
}

#[async_trait::async_trait]
impl Op for Key {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
