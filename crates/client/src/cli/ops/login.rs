use clap::Args;

use common::dispatcher::INVALID_CREDENTIALS;
use common::remote::{Credentials, RemoteFailure};

use crate::cli::op::{settled, DispatchError};

#[derive(Args, Debug, Clone)]
pub struct Login {
    #[arg(long)]
    pub login: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    Rejected(&'static str),
    #[error("login failed: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Login {
    type Error = LoginError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let credentials = Credentials::new(self.login.clone(), self.password.clone());
        let dispatch = ctx.dispatcher.login(&credentials).await;

        match settled(dispatch) {
            Ok(identity) => Ok(format!("Logged in as {}", identity.login)),
            Err(DispatchError::Remote(RemoteFailure::Unauthorized)) => {
                let message = ctx
                    .dispatcher
                    .read(|m| m.login_message())
                    .unwrap_or(INVALID_CREDENTIALS);
                Err(LoginError::Rejected(message))
            }
            Err(e) => Err(e.into()),
        }
    }
}
