//! Account API requests

use reqwest::{Client, RequestBuilder, Url};

use common::remote::{Credentials, Identity, RegistrationRequest};

use super::{ApiRequest, Service, TokenAuth};

/// Exchange credentials for a session token (HTTP basic auth)
#[derive(Clone)]
pub struct LoginRequest {
    login: String,
    password: String,
}

impl LoginRequest {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            login: credentials.login.clone(),
            password: credentials.password.clone(),
        }
    }
}

impl ApiRequest for LoginRequest {
    /// The token, as a bare JSON string
    type Response = String;

    const SERVICE: Service = Service::Account;
    const AUTH: TokenAuth = TokenAuth::None;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("login")?;
        Ok(client
            .get(full_url)
            .basic_auth(self.login, Some(self.password)))
    }
}

/// The identity behind the current session token
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityRequest;

impl ApiRequest for IdentityRequest {
    type Response = Identity;

    const SERVICE: Service = Service::Account;
    const AUTH: TokenAuth = TokenAuth::Bearer;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("user")?))
    }
}

/// Every registered identity
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitiesRequest;

impl ApiRequest for IdentitiesRequest {
    type Response = Vec<Identity>;

    const SERVICE: Service = Service::Account;
    const AUTH: TokenAuth = TokenAuth::Bearer;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(base_url.join("users")?))
    }
}

impl ApiRequest for RegistrationRequest {
    type Response = Identity;

    const SERVICE: Service = Service::Account;
    const AUTH: TokenAuth = TokenAuth::Bearer;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("register")?;
        Ok(client.post(full_url).json(&self))
    }
}
