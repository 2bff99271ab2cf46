use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Parse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Parse => write!(f, "parse error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

/// Something notable that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    FeedFetched {
        feed_url: String,
        items: usize,
        selected: usize,
    },
    FeedFailed {
        feed_url: String,
        error: FetchError,
    },
    /// An item was skipped because its timestamp could not be read.
    EntryRejected {
        feed_url: String,
        id: String,
        reason: String,
    },
    DuplicateSkipped {
        url: String,
        key: String,
    },
    /// Post text rendered; in trial mode this is the only trace of the entry.
    Rendered {
        url: String,
        text: String,
        media: usize,
        trial: bool,
    },
    Published {
        url: String,
        post_id: String,
        media: usize,
    },
    PublishFailed {
        url: String,
        reason: String,
    },
}

/// Receiver for [`RunEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    /// Entries that made it through translation.
    pub processed: usize,
    pub published: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub feeds_failed: usize,
    /// Newest `updated` among processed entries.
    pub newest: Option<DateTime<Utc>>,
    pub trial: bool,
}

impl RunReport {
    /// Whether the caller should write the state back.
    pub fn should_persist(&self) -> bool {
        !self.trial && self.processed > 0
    }
}
