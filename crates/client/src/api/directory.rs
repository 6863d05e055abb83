//! Key directory requests

use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::crypto::PublicKey;
use common::remote::{Contact, KeyReceipt, PublishReceipt};

use super::{ApiRequest, Service, TokenAuth};

/// Ask the directory to mail the current public key to `mail`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyGetRequest {
    pub mail: String,
}

impl From<&Contact> for KeyGetRequest {
    fn from(contact: &Contact) -> Self {
        Self {
            mail: contact.as_str().to_string(),
        }
    }
}

impl ApiRequest for KeyGetRequest {
    type Response = KeyReceipt;

    const SERVICE: Service = Service::Directory;
    const AUTH: TokenAuth = TokenAuth::Raw;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("key/get")?;
        Ok(client.post(full_url).json(&self))
    }
}

/// Replace the directory key; the server migrates stored wrapped keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeySendRequest {
    /// PEM text of the new public key
    pub key: String,
}

impl From<&PublicKey> for KeySendRequest {
    fn from(key: &PublicKey) -> Self {
        Self { key: key.to_pem() }
    }
}

impl ApiRequest for KeySendRequest {
    type Response = PublishReceipt;

    const SERVICE: Service = Service::Directory;
    const AUTH: TokenAuth = TokenAuth::Raw;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("key/send")?;
        Ok(client.post(full_url).json(&self))
    }
}
