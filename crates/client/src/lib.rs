/**
 * reqwest implementation of the account API
 *  and key directory contracts.
 */
pub mod api;
pub mod logging;
/**
 * Local state: config file and the persisted
 *  session token under ~/.pseudonym.
 */
pub mod state;

pub use api::{ApiClient, ApiError};
pub use state::{AppConfig, AppState, FileTokenStore, StateError};
