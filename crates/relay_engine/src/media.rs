use reqwest::header::CONTENT_TYPE;
use relay_core::{RawItem, SourceProfile};
use relay_logging::{relay_debug, relay_trace};

use crate::discover::{candidate_urls, is_media_type, MAX_MEDIA};
use crate::fetch::{check_status, read_limited, FetchSettings};
use crate::types::map_reqwest_error;
use crate::{FailureKind, FetchError};

/// A fetched image or video whose body has not been read yet.
///
/// The open response is held until [`MediaResource::into_bytes`] consumes it;
/// dropping the resource instead releases the connection.
#[derive(Debug)]
pub struct MediaResource {
    url: String,
    content_type: String,
    response: reqwest::Response,
    max_bytes: u64,
}

impl MediaResource {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Read the body, bounded by the resolver's byte ceiling.
    pub async fn into_bytes(self) -> Result<Vec<u8>, FetchError> {
        read_limited(self.response, self.max_bytes).await
    }
}

/// Resolves candidate URLs into at most [`MAX_MEDIA`] media resources.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl MediaResolver {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }

    /// Discover and resolve the media of one feed item.
    pub async fn discover(&self, item: &RawItem, profile: SourceProfile) -> Vec<MediaResource> {
        let candidates = candidate_urls(item, profile);
        relay_trace!(
            "Item {} has {} media candidates",
            item.id,
            candidates.len()
        );
        self.resolve(&candidates).await
    }

    /// Fetch candidates one at a time until [`MAX_MEDIA`] are accepted.
    ///
    /// Candidates that fail or do not serve an image or video are skipped.
    pub async fn resolve(&self, candidates: &[String]) -> Vec<MediaResource> {
        let mut accepted = Vec::new();
        for url in candidates {
            if accepted.len() >= MAX_MEDIA {
                break;
            }
            match self.fetch(url).await {
                Ok(resource) => accepted.push(resource),
                Err(err) => relay_debug!("Skipping media candidate {}: {}", url, err),
            }
        }
        accepted
    }

    async fn fetch(&self, url: &str) -> Result<MediaResource, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(&response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .unwrap_or_default();
        if !is_media_type(&content_type) {
            return Err(FetchError::new(
                FailureKind::UnsupportedContentType { content_type },
                "not an image or video",
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "media too large",
                ));
            }
        }

        Ok(MediaResource {
            url: url.to_string(),
            content_type,
            response,
            max_bytes: self.settings.max_bytes,
        })
    }
}
