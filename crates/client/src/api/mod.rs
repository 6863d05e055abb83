pub mod account;
#[allow(clippy::module_inception)]
mod client;
pub mod directory;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Which remote root a request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Account,
    Directory,
}

/// How the stored session token is attached, when one exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAuth {
    /// Request carries its own credentials
    None,
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: <token>`
    Raw,
}

pub trait ApiRequest {
    type Response: DeserializeOwned;

    const SERVICE: Service;
    const AUTH: TokenAuth;

    fn build_request(self, base_url: &Url, client: &Client)
        -> Result<RequestBuilder, url::ParseError>;
}
