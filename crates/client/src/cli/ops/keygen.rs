use std::path::PathBuf;

use clap::Args;

use common::crypto::KeyPair;

use crate::cli::op::write_new;

pub const PUBLIC_KEY_FILE: &str = "public.pem";
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// Generate a recipient key pair (for the key custodian)
#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Directory to write public.pem and private.pem into
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("failed to store key pair: {0}")]
    Store(#[source] anyhow::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let pair = KeyPair::generate();
        let public_path = self.out.join(PUBLIC_KEY_FILE);
        let private_path = self.out.join(PRIVATE_KEY_FILE);

        write_new(&private_path, &pair.private().to_pem()).map_err(KeygenError::Store)?;
        write_new(&public_path, &pair.public().to_pem()).map_err(KeygenError::Store)?;

        Ok(format!(
            "Public key: {}\nPrivate key: {}",
            public_path.display(),
            private_path.display()
        ))
    }
}
