use clap::Args;

use crate::cli::op::{settled, DispatchError};

/// Show the identity behind the stored session
#[derive(Args, Debug, Clone)]
pub struct Whoami;

#[derive(Debug, thiserror::Error)]
pub enum WhoamiError {
    #[error("failed to load identity: {0}")]
    Dispatch(#[from] DispatchError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Whoami {
    type Error = WhoamiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let Some(dispatch) = ctx.dispatcher.restore_session().await else {
            return Ok("Not logged in".to_string());
        };
        let identity = settled(dispatch)?;

        Ok(format!(
            "login:       {}\n\
             record:      {} bytes (base64)\n\
             wrapped key: {}",
            identity.login,
            identity.user_data.len(),
            identity.key_gost
        ))
    }
}
