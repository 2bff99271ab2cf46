use feed_rs::model::{Entry as FeedEntry, Feed};
use relay_core::{FetchedFeed, RawEnclosure, RawItem, RawLink};
use relay_logging::relay_debug;

use crate::fetch::{check_status, read_limited, FetchSettings};
use crate::types::map_reqwest_error;
use crate::{FailureKind, FetchError};

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed, FetchError>;
}

/// Fetches feeds over HTTP(S), or from disk for `file://` URLs, and parses
/// RSS, Atom and JSON Feed documents.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpFeedSource {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = settings.build_client()?;
        Ok(Self { client, settings })
    }

    async fn download(&self, url: reqwest::Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(&response)?;
        read_limited(response, self.settings.max_bytes).await
    }

    async fn read_file(&self, url: &reqwest::Url) -> Result<Vec<u8>, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::new(FailureKind::InvalidUrl, "not a local file path"))?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        if bytes.len() as u64 > self.settings.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    actual: Some(bytes.len() as u64),
                },
                "feed file too large",
            ));
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let bytes = match parsed.scheme() {
            "http" | "https" => self.download(parsed).await?,
            "file" => self.read_file(&parsed).await?,
            scheme => {
                return Err(FetchError::new(
                    FailureKind::InvalidUrl,
                    format!("unsupported URL scheme {scheme}"),
                ))
            }
        };
        relay_debug!("Fetched {} bytes from {}", bytes.len(), url);
        parse_feed(&bytes)
    }
}

/// Parse a feed document into raw items.
pub fn parse_feed(bytes: &[u8]) -> Result<FetchedFeed, FetchError> {
    let feed = feed_rs::parser::parse(bytes)
        .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;
    Ok(fetched_feed(feed))
}

fn fetched_feed(feed: Feed) -> FetchedFeed {
    // RSS carries the generator URL as text, Atom the name with the URL in `uri`.
    let generator = feed.generator.map(|generator| {
        if generator.content.trim().is_empty() {
            generator.uri.unwrap_or_default()
        } else {
            generator.content
        }
    });

    FetchedFeed {
        generator,
        items: feed.entries.into_iter().map(raw_item).collect(),
    }
}

fn raw_item(entry: FeedEntry) -> RawItem {
    let links = entry
        .links
        .into_iter()
        .map(|link| RawLink {
            href: link.href,
            rel: link.rel,
            media_type: link.media_type,
        })
        .collect();

    let enclosures = entry
        .media
        .iter()
        .flat_map(|object| object.content.iter())
        .filter_map(|content| {
            content.url.as_ref().map(|url| RawEnclosure {
                href: url.to_string(),
                media_type: content.content_type.as_ref().map(|mime| mime.to_string()),
            })
        })
        .collect();

    RawItem {
        id: entry.id,
        title: entry.title.map(|text| text.content),
        summary: entry.summary.map(|text| text.content),
        content: entry
            .content
            .and_then(|content| content.body)
            .into_iter()
            .collect(),
        tags: entry
            .categories
            .into_iter()
            .map(|category| category.term)
            .collect(),
        links,
        enclosures,
        updated: entry
            .updated
            .or(entry.published)
            .map(|timestamp| timestamp.to_rfc3339()),
    }
}
