use clap::Args;

use common::remote::Contact;

use crate::cli::op::{settled, DispatchError};

/// Ask the directory to mail its current public key
#[derive(Args, Debug, Clone)]
pub struct Request {
    /// Mail address the key is delivered to
    #[arg(long)]
    pub contact: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("not a valid mail address: {0}")]
    InvalidContact(String),
    #[error("key request failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Request {
    type Error = RequestError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let contact = Contact::parse(&self.contact)
            .ok_or_else(|| RequestError::InvalidContact(self.contact.clone()))?;

        let receipt = settled(ctx.dispatcher.request_key(&contact).await)?;

        Ok(format!(
            "Key sent to {} (message {})",
            contact, receipt.message_id
        ))
    }
}
