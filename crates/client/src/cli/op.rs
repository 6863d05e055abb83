use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use url::Url;

use common::dispatcher::{Dispatch, Dispatcher};
use common::remote::RemoteFailure;
use common::session::TokenStore;
use pseudonym_client::{ApiClient, ApiError, AppState};

/// Resolve a service root.
///
/// Priority: explicit flag > config file.
pub fn resolve_remote(explicit: Option<Url>, configured: &Url) -> Url {
    explicit.unwrap_or_else(|| configured.clone())
}

#[derive(Clone)]
pub struct OpContext {
    /// Drives every remote operation; owns the session model
    pub dispatcher: Dispatcher<ApiClient>,
    /// Loaded (or default) local state
    pub state: AppState,
    /// Optional custom state path (defaults to ~/.pseudonym)
    pub config_path: Option<PathBuf>,
}

impl OpContext {
    pub fn new(
        state: AppState,
        api_url: Url,
        directory_url: Url,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let tokens: Arc<dyn TokenStore> = Arc::new(state.token_store());
        let client = ApiClient::new(&api_url, &directory_url, tokens.clone())?;
        Ok(Self {
            dispatcher: Dispatcher::new(Arc::new(client), tokens),
            state,
            config_path,
        })
    }
}

/// Why a dispatched operation produced no value
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("operation already in progress")]
    Busy,
    #[error("session is no longer valid; logged out")]
    SessionEnded,
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
}

/// Flatten a dispatch into what a one-shot command cares about
pub fn settled<T>(dispatch: Dispatch<T>) -> Result<T, DispatchError> {
    match dispatch {
        Dispatch::Settled(outcome) => Ok(outcome?),
        Dispatch::Dropped => Err(DispatchError::Busy),
        Dispatch::Suppressed => Err(DispatchError::SessionEnded),
    }
}

pub fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write `contents`, refusing to clobber an existing file
pub fn write_new(path: &Path, contents: &str) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_remote_explicit_wins() {
        let explicit = Url::parse("http://example.com:9999").unwrap();
        let configured = Url::parse("http://127.0.0.1:8080").unwrap();
        assert_eq!(resolve_remote(Some(explicit.clone()), &configured), explicit);
        assert_eq!(resolve_remote(None, &configured), configured);
    }

    #[test]
    fn test_settled_flattening() {
        assert_eq!(settled(Dispatch::Settled(Ok(3))).unwrap(), 3);
        assert!(matches!(
            settled::<()>(Dispatch::Dropped),
            Err(DispatchError::Busy)
        ));
        assert!(matches!(
            settled::<()>(Dispatch::Suppressed),
            Err(DispatchError::SessionEnded)
        ));
        assert!(matches!(
            settled::<()>(Dispatch::Settled(Err(RemoteFailure::Unauthorized))),
            Err(DispatchError::Remote(RemoteFailure::Unauthorized))
        ));
    }

    #[test]
    fn test_write_new_refuses_overwrite() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("keys").join("public.pem");
        write_new(&path, "first").unwrap();
        assert!(write_new(&path, "second").is_err());
        assert_eq!(read_text(&path).unwrap(), "first");
    }
}
