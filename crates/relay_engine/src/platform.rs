use std::fmt;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::fetch::FetchSettings;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostId(pub String);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("invalid instance url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {code}: {body}")]
    Status { code: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The publishing side of a federated account.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<MediaId, PlatformError>;

    async fn post(&self, text: &str, media: &[MediaId]) -> Result<PostId, PlatformError>;
}

/// Persisted app and user credentials for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub instance_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
}

/// Mastodon REST client authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct MastodonClient {
    client: reqwest::Client,
    base: Url,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    acct: String,
}

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    media_ids: Vec<&'a str>,
}

impl MastodonClient {
    /// Build a client. No request is made until [`MastodonClient::verify`]
    /// or a publishing call.
    pub fn new(credentials: &Credentials, settings: &FetchSettings) -> Result<Self, PlatformError> {
        let mut base = Url::parse(credentials.instance_url.trim())
            .map_err(|err| PlatformError::InvalidUrl(err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base,
            access_token: credentials.access_token.clone(),
        })
    }

    /// Check the access token; returns the account handle.
    pub async fn verify(&self) -> Result<String, PlatformError> {
        let response = self
            .client
            .get(self.endpoint("api/v1/accounts/verify_credentials")?)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let account: AccountResponse = decode(response).await?;
        Ok(account.acct)
    }

    fn endpoint(&self, path: &str) -> Result<Url, PlatformError> {
        self.base
            .join(path)
            .map_err(|err| PlatformError::InvalidUrl(err.to_string()))
    }
}

#[async_trait::async_trait]
impl Platform for MastodonClient {
    async fn upload_media(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<MediaId, PlatformError> {
        let part = Part::bytes(bytes)
            .file_name("media")
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("api/v2/media")?)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let media: IdResponse = decode(response).await?;
        Ok(MediaId(media.id))
    }

    async fn post(&self, text: &str, media: &[MediaId]) -> Result<PostId, PlatformError> {
        let request = StatusRequest {
            status: text,
            media_ids: media.iter().map(|id| id.0.as_str()).collect(),
        };

        let response = self
            .client
            .post(self.endpoint("api/v1/statuses")?)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;
        let status: IdResponse = decode(response).await?;
        Ok(PostId(status.id))
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PlatformError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(PlatformError::Status {
            code: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    serde_json::from_slice(&body).map_err(|err| PlatformError::Decode(err.to_string()))
}
