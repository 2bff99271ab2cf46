//! Relay engine: feed fetching, media resolution and publishing.
mod discover;
mod events;
mod feed;
mod fetch;
mod media;
mod normalize;
mod persist;
mod platform;
mod publish;
mod runner;
mod translate;
mod types;

/// An entry whose images are open media downloads.
pub type Entry = relay_core::Entry<MediaResource>;

pub use discover::{candidate_urls, escape_non_ascii, is_media_type, MAX_MEDIA};
pub use events::LogSink;
pub use feed::{parse_feed, FeedSource, HttpFeedSource};
pub use fetch::FetchSettings;
pub use media::{MediaResolver, MediaResource};
pub use normalize::{clean, CleanRules};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use platform::{Credentials, MastodonClient, MediaId, Platform, PlatformError, PostId};
pub use publish::{Publication, PublishError, Publisher};
pub use runner::{FeedConfig, PostDelay, RunOptions, Runner};
pub use translate::{canonical_url, translate};
pub use types::{EventSink, FailureKind, FetchError, RunEvent, RunReport};
