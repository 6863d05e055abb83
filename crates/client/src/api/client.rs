use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, header::HeaderValue, header::AUTHORIZATION, Client, StatusCode};
use url::Url;

use common::crypto::PublicKey;
use common::remote::{
    AccountService, Contact, Credentials, Identity, KeyDirectory, KeyReceipt, PublishReceipt,
    RegistrationRequest, RemoteFailure, SessionToken,
};
use common::session::TokenStore;

use super::account::{IdentitiesRequest, IdentityRequest, LoginRequest};
use super::directory::{KeyGetRequest, KeySendRequest};
use super::error::ApiError;
use super::{ApiRequest, Service, TokenAuth};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the account API and the key directory
///
/// Reads the session token from its store on every call, so a token saved
/// by one operation is picked up by the next.
#[derive(Clone)]
pub struct ApiClient {
    pub api_url: Url,
    pub directory_url: Url,
    client: Client,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.api_url.as_str())
            .field("directory_url", &self.directory_url.as_str())
            .finish()
    }
}

/// `join` drops the last path segment of a base without a trailing slash
fn as_base(url: &Url) -> Url {
    let mut base = url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

impl ApiClient {
    pub fn new(
        api_url: &Url,
        directory_url: &Url,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_url: as_base(api_url),
            directory_url: as_base(directory_url),
            client,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let base_url = match T::SERVICE {
            Service::Account => &self.api_url,
            Service::Directory => &self.directory_url,
        };
        let mut request_builder = request.build_request(base_url, &self.client)?;

        if let Some(token) = self.tokens.load()? {
            request_builder = match T::AUTH {
                TokenAuth::None => request_builder,
                TokenAuth::Bearer => request_builder.bearer_auth(token.as_str()),
                TokenAuth::Raw => request_builder.header(AUTHORIZATION, token.as_str()),
            };
        }

        let response = request_builder.send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            Ok(response.json::<T::Response>().await?)
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected");
            // the status alone classifies the failure
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!("error body unreadable: {}", e);
                String::new()
            });
            Err(ApiError::HttpStatus(status, body))
        }
    }
}

#[async_trait]
impl AccountService for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken, RemoteFailure> {
        let token = self.call(LoginRequest::new(credentials)).await?;
        Ok(SessionToken::new(token))
    }

    async fn fetch_identity(&self) -> Result<Identity, RemoteFailure> {
        Ok(self.call(IdentityRequest).await?)
    }

    async fn fetch_identities(&self) -> Result<Vec<Identity>, RemoteFailure> {
        Ok(self.call(IdentitiesRequest).await?)
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<Identity, RemoteFailure> {
        Ok(self.call(request.clone()).await?)
    }
}

#[async_trait]
impl KeyDirectory for ApiClient {
    async fn request_key(&self, contact: &Contact) -> Result<KeyReceipt, RemoteFailure> {
        Ok(self.call(KeyGetRequest::from(contact)).await?)
    }

    async fn publish_key(&self, key: &PublicKey) -> Result<PublishReceipt, RemoteFailure> {
        Ok(self.call(KeySendRequest::from(key)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_urls_gain_trailing_slash() {
        let api = Url::parse("http://127.0.0.1:8080").unwrap();
        let dir = Url::parse("http://127.0.0.1:8081/directory").unwrap();
        let tokens: Arc<dyn TokenStore> = Arc::new(common::session::MemoryTokenStore::new());
        let client = ApiClient::new(&api, &dir, tokens).unwrap();

        assert_eq!(client.api_url.join("user").unwrap().as_str(), "http://127.0.0.1:8080/user");
        assert_eq!(
            client.directory_url.join("key/get").unwrap().as_str(),
            "http://127.0.0.1:8081/directory/key/get"
        );
    }
}
