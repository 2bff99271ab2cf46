//! Relay core: pure data model and algorithms for the feed-to-post pipeline.
mod dedupe;
mod entry;
mod hashtag;
mod profile;
mod raw;
mod state;
mod template;
mod timestamp;
mod watermark;

pub use dedupe::{DedupHistory, DedupeField, UnknownField, DEDUPE_HISTORY_LIMIT};
pub use entry::{Entry, TEMPLATE_FIELDS};
pub use hashtag::{hashtag, hashtags};
pub use profile::SourceProfile;
pub use raw::{FetchedFeed, RawEnclosure, RawItem, RawLink};
pub use state::RunState;
pub use template::{render, truncate_chars, TemplateError, MAX_POST_CHARS};
pub use timestamp::{parse_timestamp, TimestampError, MIN_TIMESTAMP};
pub use watermark::{select, DatedItem, FuturePolicy, RejectedItem, Selection};
