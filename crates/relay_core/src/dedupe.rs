use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of recent keys kept in the dedup history.
pub const DEDUPE_HISTORY_LIMIT: usize = 11;

/// Entry field used as the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeField {
    Url,
    Link,
    Title,
    Summary,
    Content,
    Hashtags,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entry field {0:?} (valid: url, link, title, summary, content, hashtags)")]
pub struct UnknownField(pub String);

impl FromStr for DedupeField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "link" => Ok(Self::Link),
            "title" => Ok(Self::Title),
            "summary" => Ok(Self::Summary),
            "content" => Ok(Self::Content),
            "hashtags" => Ok(Self::Hashtags),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

impl fmt::Display for DedupeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DedupeField::Url => "url",
            DedupeField::Link => "link",
            DedupeField::Title => "title",
            DedupeField::Summary => "summary",
            DedupeField::Content => "content",
            DedupeField::Hashtags => "hashtags",
        };
        f.write_str(name)
    }
}

/// Bounded FIFO of recently published dedup keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupHistory {
    keys: VecDeque<String>,
}

impl DedupHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted keys, oldest first. Only the newest
    /// [`DEDUPE_HISTORY_LIMIT`] keys are kept.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::new();
        for key in keys {
            history.record(key);
        }
        history
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|known| known == key)
    }

    /// Append a key, evicting the oldest once the history is full.
    pub fn record(&mut self, key: impl Into<String>) {
        while self.keys.len() >= DEDUPE_HISTORY_LIMIT {
            self.keys.pop_front();
        }
        self.keys.push_back(key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys oldest first, as persisted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}
