use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use common::remote::SessionToken;
use common::session::{TokenStore, TokenStoreError};

pub const APP_NAME: &str = "pseudonym";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const TOKEN_FILE_NAME: &str = "session.token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the account API
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    /// Root of the key directory microservice
    #[serde(default = "default_directory_url")]
    pub directory_url: Url,
    /// Default log level; `RUST_LOG` still wins
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily log files (stderr only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_api_url() -> Url {
    Url::parse("http://127.0.0.1:8080").expect("hardcoded URL must parse")
}

fn default_directory_url() -> Url {
    Url::parse("http://127.0.0.1:8081").expect("hardcoded URL must parse")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            directory_url: default_directory_url(),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn level(&self) -> Result<tracing::Level, StateError> {
        self.log_level
            .parse()
            .map_err(|_| StateError::InvalidLogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.pseudonym)
    pub state_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Path to the persisted session token
    pub token_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.pseudonym)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if state_dir.join(CONFIG_FILE_NAME).exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&state_dir)?;

        let config = config.unwrap_or_default();
        config.level()?;
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            token_path: state_dir.join(TOKEN_FILE_NAME),
            state_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if !state_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        config.level()?;

        Ok(Self {
            token_path: state_dir.join(TOKEN_FILE_NAME),
            state_dir,
            config_path,
            config,
        })
    }

    /// Load if initialized, otherwise run on defaults without touching disk
    pub fn load_or_default(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        match Self::load(custom_path.clone()) {
            Err(StateError::NotInitialized) => {
                let state_dir = Self::state_dir(custom_path)?;
                Ok(Self {
                    config_path: state_dir.join(CONFIG_FILE_NAME),
                    token_path: state_dir.join(TOKEN_FILE_NAME),
                    state_dir,
                    config: AppConfig::default(),
                })
            }
            other => other,
        }
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(self.token_path.clone())
    }
}

/// Session token persisted as a single file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn backend(e: std::io::Error) -> TokenStoreError {
    TokenStoreError::Backend(e.to_string())
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SessionToken>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::new(text)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend(e)),
        }
    }

    fn save(&self, token: &SessionToken) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(backend)?;
        }
        fs::write(&self.path, token.as_str()).map_err(backend)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(backend(e)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("pseudonym directory not initialized. Run 'pseudonym init' first")]
    NotInitialized,

    #[error("pseudonym directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_load() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("state");

        let state = AppState::init(Some(dir.clone()), None).unwrap();
        assert!(state.config_path.exists());
        assert_eq!(state.config.api_url.as_str(), "http://127.0.0.1:8080/");

        let loaded = AppState::load(Some(dir.clone())).unwrap();
        assert_eq!(loaded.config.directory_url, state.config.directory_url);
        assert_eq!(loaded.token_path, dir.join(TOKEN_FILE_NAME));

        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("missing");

        assert!(matches!(
            AppState::load(Some(dir.clone())),
            Err(StateError::NotInitialized)
        ));
        let state = AppState::load_or_default(Some(dir.clone())).unwrap();
        assert_eq!(state.config.log_level, "info");
        assert!(!dir.exists());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "api_url = \"http://registry.local:9000/\"\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let state = AppState::load(Some(temp.path().to_path_buf())).unwrap();
        assert_eq!(state.config.api_url.as_str(), "http://registry.local:9000/");
        assert_eq!(state.config.directory_url.as_str(), "http://127.0.0.1:8081/");
        assert_eq!(state.config.level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "log_level = \"loud\"\n").unwrap();

        assert!(matches!(
            AppState::load(Some(temp.path().to_path_buf())),
            Err(StateError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_file_token_store() {
        let temp = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp.path().join("nested").join(TOKEN_FILE_NAME));

        assert_eq!(store.load().unwrap(), None);
        store.save(&SessionToken::new("abc123")).unwrap();
        assert_eq!(store.load().unwrap(), Some(SessionToken::new("abc123")));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        // clearing twice is fine
        store.clear().unwrap();
    }
}
