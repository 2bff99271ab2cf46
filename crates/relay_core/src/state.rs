use chrono::{DateTime, Utc};

use crate::{DedupHistory, MIN_TIMESTAMP};

/// State carried from one run to the next.
///
/// Loaded before the first feed is processed, handed to the runner by `&mut`,
/// and persisted by the caller once the run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    watermark: DateTime<Utc>,
    dedupe: DedupHistory,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            watermark: MIN_TIMESTAMP,
            dedupe: DedupHistory::new(),
        }
    }
}

impl RunState {
    /// Build from persisted values; an absent watermark means "nothing published yet".
    pub fn new(watermark: Option<DateTime<Utc>>, dedupe: Vec<String>) -> Self {
        Self {
            watermark: watermark.unwrap_or(MIN_TIMESTAMP),
            dedupe: DedupHistory::from_keys(dedupe),
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    /// The watermark, or `None` while it is still the initial sentinel.
    pub fn persisted_watermark(&self) -> Option<DateTime<Utc>> {
        (self.watermark != MIN_TIMESTAMP).then_some(self.watermark)
    }

    /// Move the watermark forward to `candidate`. Never moves it back.
    pub fn advance_watermark(&mut self, candidate: DateTime<Utc>) {
        if candidate > self.watermark {
            self.watermark = candidate;
        }
    }

    pub fn dedupe(&self) -> &DedupHistory {
        &self.dedupe
    }

    pub fn dedupe_mut(&mut self) -> &mut DedupHistory {
        &mut self.dedupe
    }
}
