use std::path::PathBuf;

use clap::Args;
use url::Url;

use pseudonym_client::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Account API root
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub api: Url,

    /// Key directory root
    #[arg(long, default_value = "http://127.0.0.1:8081")]
    pub directory: Url,

    /// Default log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write daily log files here as well as to stderr
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_url: self.api.clone(),
            directory_url: self.directory.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let log_dir = match &state.config.log_dir {
            Some(dir) => dir.display().to_string(),
            None => "stderr only".to_string(),
        };

        Ok(format!(
            "Initialized pseudonym directory at: {}\n\
             - Config: {}\n\
             - Session token: {}\n\
             - Account API: {}\n\
             - Key directory: {}\n\
             - Logs: {}",
            state.state_dir.display(),
            state.config_path.display(),
            state.token_path.display(),
            state.config.api_url,
            state.config.directory_url,
            log_dir
        ))
    }
}
